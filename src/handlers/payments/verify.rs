use axum::extract::State;
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::extractors::{Json, Path};
use crate::models::DonationWithEvent;

use super::common::record_paid_session;

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub success: bool,
    pub donation: DonationWithEvent,
}

/// Session ids are opaque gateway tokens such as `cs_test_a1B2`.
fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() {
        return Err(AppError::BadRequest(msg::SESSION_ID_REQUIRED.into()));
    }
    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::BadRequest(msg::INVALID_SESSION_ID.into()));
    }
    Ok(())
}

/// Confirm a checkout with the gateway and record its donation once.
///
/// Safe to call any number of times (and concurrently with the webhook):
/// every caller gets the same donation back and the event is credited once.
pub async fn verify_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<VerifySessionResponse>> {
    validate_session_id(&session_id)?;

    let session = state.gateway.retrieve_session(&session_id).await?;
    if !session.is_paid() {
        tracing::info!(
            "Verification of {} refused: payment_status={}",
            session.id,
            session.payment_status
        );
        return Err(AppError::PaymentNotCompleted(session.payment_status));
    }

    let mut conn = state.db.get()?;
    let outcome = record_paid_session(&mut conn, &session, &state.currency)?;

    Ok(Json(VerifySessionResponse {
        success: true,
        donation: outcome.into_donation(),
    }))
}
