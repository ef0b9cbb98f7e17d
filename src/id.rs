//! Prefixed ID generation for stored entities.
//!
//! Format: `dt_{entity}_{uuid_simple}` (32 hex chars, no hyphens). The brand
//! prefix keeps our ids visually distinct from Stripe's `cs_`, `pi_`, `cus_`.

use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    DonationEvent,
    Donation,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "dt_usr",
            Self::DonationEvent => "dt_evt",
            Self::Donation => "dt_don",
        }
    }

    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
