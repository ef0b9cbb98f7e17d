use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{DonationEvent, DonationEventSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

/// One recorded payment against a donation event. Immutable once succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub donation_event_id: String,
    /// None for anonymous gifts without an account, or after the donor was deleted
    pub donor_id: Option<String>,
    pub is_anonymous: bool,
    /// Gateway checkout session id; unique across all donations
    pub payment_id: String,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
}

/// Insert payload built by the reconciliation flow from gateway session data.
#[derive(Debug, Clone)]
pub struct CreateDonation {
    pub amount_cents: i64,
    pub currency: String,
    pub donation_event_id: String,
    pub donor_id: Option<String>,
    pub is_anonymous: bool,
    pub payment_id: String,
    pub payment_status: PaymentStatus,
}

/// A donation joined with the event it funds.
#[derive(Debug, Clone, Serialize)]
pub struct DonationWithEvent {
    #[serde(flatten)]
    pub donation: Donation,
    pub donation_event: Option<DonationEvent>,
}

/// A donor's own donation with a summary of the funded event.
#[derive(Debug, Clone, Serialize)]
pub struct DonorDonation {
    #[serde(flatten)]
    pub donation: Donation,
    pub donation_event: Option<DonationEventSummary>,
}

/// Aggregate figures for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_donors: i64,
    pub total_events: i64,
    pub active_events: i64,
    pub total_raised_cents: i64,
    pub total_donations: i64,
}
