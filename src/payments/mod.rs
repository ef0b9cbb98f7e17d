//! Hosted checkout providers.
//!
//! Handlers talk to the provider through [`PaymentGateway`] so the
//! reconciliation flow can be exercised against a fake in tests.

mod stripe;

pub use stripe::*;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Donation context attached to a checkout session and echoed back by the
/// provider. Values are strings because provider metadata is string-typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DonationMetadata {
    #[serde(default)]
    pub donation_event_id: Option<String>,
    /// "true" / "false"
    #[serde(default)]
    pub is_anonymous: Option<String>,
    #[serde(default)]
    pub donor_id: Option<String>,
}

impl DonationMetadata {
    pub fn new(donation_event_id: &str, is_anonymous: bool, donor_id: Option<&str>) -> Self {
        Self {
            donation_event_id: Some(donation_event_id.to_string()),
            is_anonymous: Some(is_anonymous.to_string()),
            donor_id: donor_id.map(str::to_string),
        }
    }

    /// Only the exact string "true" marks a gift anonymous.
    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous.as_deref() == Some("true")
    }

    /// Event id, ignoring blank values.
    pub fn event_id(&self) -> Option<&str> {
        self.donation_event_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Donor id, ignoring blank values.
    pub fn donor_id(&self) -> Option<&str> {
        self.donor_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Everything needed to open a one-item hosted checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: DonationMetadata,
}

/// A freshly created checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// The provider's view of a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySession {
    pub id: String,
    /// "paid", "unpaid" or "no_payment_required"
    pub payment_status: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: DonationMetadata,
}

impl GatewaySession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// A verified webhook notification, reduced to what we act on.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A checkout session finished; it may still be unpaid for delayed methods.
    CheckoutCompleted(GatewaySession),
    /// Any other event type (carried for logging)
    Ignored(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Header carrying the webhook signature.
    fn signature_header(&self) -> &'static str;

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;

    /// Fetch a session by id. An unknown id is `AppError::NotFound`.
    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession>;

    /// Check a webhook signature over the raw body. `Ok(false)` means the
    /// signature is well-formed but wrong or stale.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool>;

    /// Parse a webhook body. Only call after the signature verified.
    fn parse_webhook_event(&self, payload: &[u8]) -> Result<GatewayEvent>;
}
