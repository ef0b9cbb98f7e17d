//! Idempotent recording of paid checkout sessions.
//!
//! Shared by session verification and the webhook so both paths converge on
//! the same donation row for a given payment.

use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::error::{AppError, OptionExt, Result, msg};
use crate::models::{CreateDonation, DonationWithEvent, PaymentStatus};
use crate::payments::GatewaySession;

/// How a paid session was reconciled.
#[derive(Debug)]
pub enum RecordOutcome {
    /// This call created the donation and credited the event.
    Recorded(DonationWithEvent),
    /// A donation for this payment already existed; nothing changed.
    Replayed(DonationWithEvent),
}

impl RecordOutcome {
    pub fn into_donation(self) -> DonationWithEvent {
        match self {
            RecordOutcome::Recorded(d) | RecordOutcome::Replayed(d) => d,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, RecordOutcome::Replayed(_))
    }
}

/// Load the donation already recorded for a payment, joined with its event.
pub fn find_recorded_donation(conn: &Connection, payment_id: &str) -> Result<Option<DonationWithEvent>> {
    let Some(donation) = queries::get_donation_by_payment_id(conn, payment_id)? else {
        return Ok(None);
    };
    let donation_event = queries::get_donation_event_by_id(conn, &donation.donation_event_id)?;
    Ok(Some(DonationWithEvent {
        donation,
        donation_event,
    }))
}

/// Record a paid session exactly once.
///
/// The donation insert and the event credit share one IMMEDIATE transaction.
/// UNIQUE(payment_id) decides concurrent races: the loser rolls back and
/// returns the winner's row.
pub fn record_paid_session(
    conn: &mut Connection,
    session: &GatewaySession,
    default_currency: &str,
) -> Result<RecordOutcome> {
    if !session.is_paid() {
        return Err(AppError::PaymentNotCompleted(session.payment_status.clone()));
    }

    if let Some(existing) = find_recorded_donation(conn, &session.id)? {
        tracing::debug!("Payment {} already recorded as {}", session.id, existing.donation.id);
        return Ok(RecordOutcome::Replayed(existing));
    }

    let event_id = session
        .metadata
        .event_id()
        .ok_or_else(|| AppError::BadRequest(msg::METADATA_MISSING_EVENT.into()))?;
    let amount_cents = match session.amount_total {
        Some(amount) if amount > 0 => amount,
        Some(amount) => {
            return Err(AppError::Gateway(format!(
                "Checkout session {} has non-positive amount_total {}",
                session.id, amount
            )));
        }
        None => {
            return Err(AppError::Gateway(format!(
                "Checkout session {} has no amount_total",
                session.id
            )));
        }
    };
    let currency = session
        .currency
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency)
        .to_lowercase();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    queries::get_donation_event_by_id(&tx, event_id)?.or_not_found(msg::EVENT_NOT_FOUND)?;

    let donor_id = match session.metadata.donor_id() {
        Some(id) if queries::get_user_by_id(&tx, id)?.is_some() => Some(id.to_string()),
        Some(id) => {
            tracing::warn!(
                "Payment {} names unknown donor {}; recording without donor",
                session.id,
                id
            );
            None
        }
        None => None,
    };

    let input = CreateDonation {
        amount_cents,
        currency,
        donation_event_id: event_id.to_string(),
        donor_id,
        is_anonymous: session.metadata.is_anonymous(),
        payment_id: session.id.clone(),
        payment_status: PaymentStatus::Succeeded,
    };

    let donation = match queries::create_donation(&tx, &input) {
        Ok(donation) => donation,
        Err(AppError::Conflict(_)) => {
            drop(tx);
            tracing::info!("Lost recording race for payment {}; replaying", session.id);
            return find_recorded_donation(conn, &session.id)?
                .map(RecordOutcome::Replayed)
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Donation for payment {} vanished after conflict",
                        session.id
                    ))
                });
        }
        Err(e) => return Err(e),
    };

    let event = queries::apply_payment_to_event(&tx, event_id, amount_cents)?;
    tx.commit()?;

    tracing::info!(
        "Recorded donation {} of {} {} for event {} (raised {}/{}, {})",
        donation.id,
        donation.amount_cents,
        donation.currency,
        event.id,
        event.raised_cents,
        event.goal_cents,
        event.status.as_ref()
    );

    Ok(RecordOutcome::Recorded(DonationWithEvent {
        donation,
        donation_event: Some(event),
    }))
}
