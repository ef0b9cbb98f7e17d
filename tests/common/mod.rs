//! Test utilities and fixtures for Donation Tracker integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

// Re-export the main library crate
pub use donation_tracker::crypto::hash_password;
pub use donation_tracker::db::{AppState, create_pool, init_db, queries};
pub use donation_tracker::error::{AppError, Result};
pub use donation_tracker::handlers;
pub use donation_tracker::jwt::TokenIssuer;
pub use donation_tracker::models::*;
pub use donation_tracker::payments::{
    CheckoutRequest, CheckoutSession, DonationMetadata, GatewayEvent, GatewaySession,
    PaymentGateway, STRIPE_SIGNATURE_HEADER, compute_stripe_signature, parse_stripe_event,
    verify_stripe_signature,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret";
pub const TEST_FRONTEND_URL: &str = "http://localhost:3000";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

// ============================================================================
// Fake payment gateway
// ============================================================================

/// In-memory stand-in for Stripe.
///
/// Sessions created through checkout start out unpaid; tests flip them with
/// [`FakeGateway::mark_paid`] or insert arbitrary sessions directly. Webhook
/// signatures use the real Stripe scheme with [`TEST_WEBHOOK_SECRET`].
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, GatewaySession>>,
    requests: Mutex<Vec<CheckoutRequest>>,
    created: AtomicUsize,
    retrieved: AtomicUsize,
}

impl FakeGateway {
    pub fn insert_session(&self, session: GatewaySession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn mark_paid(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(session_id).expect("unknown fake session");
        session.payment_status = "paid".to_string();
    }

    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn retrieved_count(&self) -> usize {
        self.retrieved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn signature_header(&self) -> &'static str {
        STRIPE_SIGNATURE_HEADER
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_test_fake{}", n);

        self.requests.lock().unwrap().push(request.clone());
        self.insert_session(GatewaySession {
            id: id.clone(),
            payment_status: "unpaid".to_string(),
            amount_total: Some(request.amount_cents),
            currency: Some(request.currency.clone()),
            metadata: request.metadata.clone(),
        });

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/c/pay/{}", id),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession> {
        self.retrieved.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Payment session not found".into()))
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        verify_stripe_signature(TEST_WEBHOOK_SECRET, payload, signature, now())
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> Result<GatewayEvent> {
        parse_stripe_event(payload)
    }
}

// ============================================================================
// App / database setup
// ============================================================================

/// Application state over a throwaway on-disk database.
///
/// A file (rather than `:memory:`) lets every pooled connection see the same
/// data. Keep the value alive for the duration of the test.
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test.db");
        let pool = create_pool(path.to_str().expect("temp path is utf-8"))
            .expect("Failed to create pool");
        {
            let conn = pool.get().unwrap();
            init_db(&conn).expect("Failed to initialize schema");
        }

        let gateway = Arc::new(FakeGateway::default());
        let state = AppState {
            db: pool,
            gateway: gateway.clone(),
            tokens: TokenIssuer::new(TEST_JWT_SECRET, 30),
            frontend_url: TEST_FRONTEND_URL.to_string(),
            currency: "usd".to_string(),
        };

        Self {
            state,
            gateway,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        handlers::router(self.state.clone())
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().expect("Failed to get connection")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user).expect("Failed to issue token")
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn create_test_user(conn: &Connection, email: &str, role: Role) -> User {
    let input = CreateUser {
        name: format!("Test User {}", email),
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        university: None,
        address: None,
    };
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    queries::create_user(conn, &input, &hash, role).expect("Failed to create test user")
}

pub fn create_test_event(conn: &Connection, title: &str, goal_cents: i64) -> DonationEvent {
    let input = CreateDonationEvent {
        title: title.to_string(),
        goal_cents,
        details: format!("Details for {}", title),
        image_url: None,
    };
    queries::create_donation_event(conn, &input, None).expect("Failed to create test event")
}

/// A paid checkout session as the gateway would report it.
pub fn paid_session(
    session_id: &str,
    event_id: &str,
    amount_cents: i64,
    donor_id: Option<&str>,
) -> GatewaySession {
    GatewaySession {
        id: session_id.to_string(),
        payment_status: "paid".to_string(),
        amount_total: Some(amount_cents),
        currency: Some("usd".to_string()),
        metadata: DonationMetadata::new(event_id, false, donor_id),
    }
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// Webhook helpers
// ============================================================================

/// Stripe event JSON wrapping a checkout session.
pub fn checkout_event_payload(event_type: &str, session: &GatewaySession) -> String {
    let mut metadata = serde_json::Map::new();
    if let Some(ref id) = session.metadata.donation_event_id {
        metadata.insert("donation_event_id".into(), Value::String(id.clone()));
    }
    if let Some(ref anon) = session.metadata.is_anonymous {
        metadata.insert("is_anonymous".into(), Value::String(anon.clone()));
    }
    if let Some(ref donor) = session.metadata.donor_id {
        metadata.insert("donor_id".into(), Value::String(donor.clone()));
    }

    serde_json::json!({
        "id": format!("evt_{}", session.id),
        "type": event_type,
        "data": {
            "object": {
                "id": session.id,
                "object": "checkout.session",
                "payment_status": session.payment_status,
                "amount_total": session.amount_total,
                "currency": session.currency,
                "metadata": metadata,
            }
        }
    })
    .to_string()
}

/// A valid `Stripe-Signature` header for `payload`, signed now.
pub fn stripe_signature_header(payload: &[u8]) -> String {
    let timestamp = now().to_string();
    let signature = compute_stripe_signature(TEST_WEBHOOK_SECRET, &timestamp, payload)
        .expect("Failed to sign payload");
    format!("t={},v1={}", timestamp, signature)
}

// ============================================================================
// Request helpers
// ============================================================================

/// Build a request with an optional bearer token and JSON body.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the response body as JSON (Null when empty or not JSON).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
