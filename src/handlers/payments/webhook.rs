use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::AppError;
use crate::extractors::Json;
use crate::payments::GatewayEvent;

use super::common::{RecordOutcome, record_paid_session};

/// Plain-text rejection; the provider only looks at the status code.
pub type WebhookRejection = (StatusCode, &'static str);

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

fn ack() -> Json<WebhookAck> {
    Json(WebhookAck { received: true })
}

/// Payment provider webhook.
///
/// The signature is checked over the raw body before anything is parsed.
/// A paid, completed checkout is recorded through the same idempotent path as
/// session verification, so redelivery and verify/webhook races are harmless.
/// Failures a retry cannot fix are acknowledged; store failures return 500
/// so the provider redelivers.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookRejection> {
    let gateway = &state.gateway;

    let signature = headers
        .get(gateway.signature_header())
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::BAD_REQUEST, "Missing signature header"))?;

    match gateway.verify_webhook_signature(&body, signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("{} webhook rejected: invalid signature", gateway.provider_name());
            return Err((StatusCode::BAD_REQUEST, "Invalid signature"));
        }
        Err(e) => {
            tracing::warn!("{} webhook rejected: {}", gateway.provider_name(), e);
            return Err((StatusCode::BAD_REQUEST, "Invalid signature header"));
        }
    }

    let event = gateway.parse_webhook_event(&body).map_err(|e| {
        tracing::warn!("{} webhook payload rejected: {}", gateway.provider_name(), e);
        (StatusCode::BAD_REQUEST, "Invalid payload")
    })?;

    let session = match event {
        GatewayEvent::CheckoutCompleted(session) => session,
        GatewayEvent::Ignored(event_type) => {
            tracing::debug!("Ignoring {} webhook event {}", gateway.provider_name(), event_type);
            return Ok(ack());
        }
    };

    if !session.is_paid() {
        tracing::info!(
            "Checkout {} completed with payment_status={}; waiting for payment",
            session.id,
            session.payment_status
        );
        return Ok(ack());
    }

    let mut conn = state.db.get().map_err(|e| {
        tracing::error!("DB connection error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })?;

    match record_paid_session(&mut conn, &session, &state.currency) {
        Ok(RecordOutcome::Recorded(d)) => {
            tracing::info!("Webhook recorded donation {} for payment {}", d.donation.id, session.id);
        }
        Ok(RecordOutcome::Replayed(_)) => {
            tracing::debug!("Webhook redelivery for payment {} already recorded", session.id);
        }
        Err(
            e @ (AppError::NotFound(_)
            | AppError::BadRequest(_)
            | AppError::PaymentNotCompleted(_)
            | AppError::Gateway(_)),
        ) => {
            tracing::warn!("Webhook for payment {} not recordable: {}", session.id, e);
        }
        Err(e) => {
            tracing::error!("Webhook for payment {} failed: {}", session.id, e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error"));
        }
    }

    Ok(ack())
}
