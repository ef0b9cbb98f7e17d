use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result, msg};
use crate::extractors::Validate;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Completed,
}

impl EventStatus {
    /// Status an event should have given its totals.
    ///
    /// Completion is sticky: a completed event stays completed whatever the
    /// totals say, and an active one completes once `raised >= goal`.
    pub fn settle(self, raised_cents: i64, goal_cents: i64) -> Self {
        match self {
            EventStatus::Completed => EventStatus::Completed,
            EventStatus::Active if raised_cents >= goal_cents => EventStatus::Completed,
            EventStatus::Active => EventStatus::Active,
        }
    }
}

/// A fundraising campaign with a monetary goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationEvent {
    pub id: String,
    pub title: String,
    pub goal_cents: i64,
    pub details: String,
    pub image_url: Option<String>,
    /// Never decreases.
    pub raised_cents: i64,
    pub status: EventStatus,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateDonationEvent {
    pub title: String,
    pub goal_cents: i64,
    pub details: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Validate for CreateDonationEvent {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest(msg::TITLE_EMPTY.into()));
        }
        if self.details.trim().is_empty() {
            return Err(AppError::BadRequest(msg::DETAILS_EMPTY.into()));
        }
        if self.goal_cents <= 0 {
            return Err(AppError::BadRequest(msg::GOAL_NOT_POSITIVE.into()));
        }
        Ok(())
    }
}

/// Admin edit. Raised total and status are not editable directly.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateDonationEvent {
    pub title: Option<String>,
    pub goal_cents: Option<i64>,
    pub details: Option<String>,
    pub image_url: Option<String>,
}

impl Validate for UpdateDonationEvent {
    fn validate(&self) -> Result<()> {
        if let Some(ref title) = self.title
            && title.trim().is_empty()
        {
            return Err(AppError::BadRequest(msg::TITLE_EMPTY.into()));
        }
        if let Some(ref details) = self.details
            && details.trim().is_empty()
        {
            return Err(AppError::BadRequest(msg::DETAILS_EMPTY.into()));
        }
        if let Some(goal) = self.goal_cents
            && goal <= 0
        {
            return Err(AppError::BadRequest(msg::GOAL_NOT_POSITIVE.into()));
        }
        Ok(())
    }
}

/// Compact view of an event embedded in donor donation listings.
#[derive(Debug, Clone, Serialize)]
pub struct DonationEventSummary {
    pub id: String,
    pub title: String,
    pub goal_cents: i64,
    pub status: EventStatus,
}
