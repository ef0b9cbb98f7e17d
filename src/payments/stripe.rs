use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{CheckoutRequest, CheckoutSession, GatewayEvent, GatewaySession, PaymentGateway};
use crate::config::StripeSettings;
use crate::error::{AppError, Result, msg};

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a webhook timestamp before it's rejected (in seconds).
/// Stripe recommends 300 seconds (5 minutes).
const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Allowed clock skew for timestamps from the future (in seconds).
const WEBHOOK_FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(settings: &StripeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            secret_key: settings.secret_key.clone(),
            webhook_secret: settings.webhook_secret.clone(),
            api_base: settings.api_base.clone(),
        })
    }

    /// Turn a non-2xx Stripe response into a gateway error carrying Stripe's message.
    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(body);
        tracing::warn!("Stripe API error ({}): {}", status, message);
        AppError::Gateway(format!("Stripe API error: {}", message))
    }
}

/// Form fields for a one-item, ad-hoc priced checkout session.
fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", "payment".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", request.currency.clone()),
        (
            "line_items[0][price_data][unit_amount]",
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]",
            request.description.clone(),
        ),
    ];

    if let Some(ref image) = request.image_url {
        form.push((
            "line_items[0][price_data][product_data][images][0]",
            image.clone(),
        ));
    }
    if let Some(ref email) = request.customer_email {
        form.push(("customer_email", email.clone()));
    }

    let meta = &request.metadata;
    if let Some(ref event_id) = meta.donation_event_id {
        form.push(("metadata[donation_event_id]", event_id.clone()));
    }
    if let Some(ref anonymous) = meta.is_anonymous {
        form.push(("metadata[is_anonymous]", anonymous.clone()));
    }
    if let Some(ref donor_id) = meta.donor_id {
        form.push(("metadata[donor_id]", donor_id.clone()));
    }

    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    fn provider_name(&self) -> &'static str {
        "stripe"
    }

    fn signature_header(&self) -> &'static str {
        STRIPE_SIGNATURE_HEADER
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: CreateCheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse Stripe response: {}", e)))?;

        let url = session
            .url
            .ok_or_else(|| AppError::Gateway("Stripe returned a session without a URL".into()))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Stripe API error: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(msg::SESSION_NOT_FOUND.into()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse Stripe response: {}", e)))
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        verify_stripe_signature(
            &self.webhook_secret,
            payload,
            signature,
            chrono::Utc::now().timestamp(),
        )
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> Result<GatewayEvent> {
        parse_stripe_event(payload)
    }
}

/// Verify a `Stripe-Signature` header (`t=timestamp,v1=sig[,v1=sig...]`)
/// against the raw payload as of `now`.
///
/// Malformed headers are an error; a stale timestamp or no matching `v1`
/// signature is `Ok(false)`.
pub fn verify_stripe_signature(
    webhook_secret: &str,
    payload: &[u8],
    signature: &str,
    now: i64,
) -> Result<bool> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in signature.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(s) = part.strip_prefix("v1=") {
            candidates.push(s);
        }
    }

    let timestamp_str =
        timestamp.ok_or_else(|| AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()))?;
    if candidates.is_empty() {
        return Err(AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()));
    }

    let timestamp: i64 = timestamp_str
        .parse()
        .map_err(|_| AppError::BadRequest(msg::INVALID_TIMESTAMP_IN_SIGNATURE.into()))?;

    let Some(age) = now.checked_sub(timestamp) else {
        tracing::warn!("Stripe webhook rejected: timestamp out of range ({})", timestamp);
        return Ok(false);
    };
    if age > WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
        tracing::warn!(
            "Stripe webhook rejected: timestamp too old (age={}s, max={}s)",
            age,
            WEBHOOK_TIMESTAMP_TOLERANCE_SECS
        );
        return Ok(false);
    }
    if age < -WEBHOOK_FUTURE_SKEW_SECS {
        tracing::warn!("Stripe webhook rejected: timestamp in the future (age={}s)", age);
        return Ok(false);
    }

    let expected = compute_stripe_signature(webhook_secret, timestamp_str, payload)?;
    let expected_bytes = expected.as_bytes();

    // Length is public (64 hex chars), the comparison itself is constant-time
    Ok(candidates.iter().any(|candidate| {
        let provided = candidate.as_bytes();
        provided.len() == expected_bytes.len() && bool::from(expected_bytes.ct_eq(provided))
    }))
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`, as Stripe signs webhooks.
pub fn compute_stripe_signature(webhook_secret: &str, timestamp: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Generic Stripe webhook event - object is parsed based on event_type
#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

/// Parse a verified Stripe webhook body.
///
/// `checkout.session.completed` and `checkout.session.async_payment_succeeded`
/// carry a checkout session; every other type is ignored.
pub fn parse_stripe_event(payload: &[u8]) -> Result<GatewayEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    match event.event_type.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            let session: GatewaySession = serde_json::from_value(event.data.object)
                .map_err(|e| AppError::BadRequest(format!("Invalid checkout session: {}", e)))?;
            Ok(GatewayEvent::CheckoutCompleted(session))
        }
        _ => Ok(GatewayEvent::Ignored(event.event_type)),
    }
}
