use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Validate, ValidJson};
use crate::payments::{CheckoutRequest, DonationMetadata};
use crate::util::{is_http_url, with_session_placeholder};

/// Stripe's per-charge ceiling in minor units.
pub const MAX_DONATION_CENTS: i64 = 99_999_999;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub amount_cents: i64,
    pub donation_event_id: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub donor_id: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

impl Validate for CreateCheckoutRequest {
    fn validate(&self) -> Result<()> {
        if self.amount_cents <= 0 {
            return Err(AppError::BadRequest(msg::AMOUNT_REQUIRED.into()));
        }
        if self.amount_cents > MAX_DONATION_CENTS {
            return Err(AppError::BadRequest(msg::AMOUNT_TOO_LARGE.into()));
        }
        if self.donation_event_id.trim().is_empty() {
            return Err(AppError::BadRequest(msg::EVENT_ID_REQUIRED.into()));
        }
        for url in [&self.success_url, &self.cancel_url].into_iter().flatten() {
            if !is_http_url(url) {
                return Err(AppError::BadRequest(msg::INVALID_REDIRECT_URL.into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub url: String,
    pub session_id: String,
}

/// Open a hosted checkout for a donation. Nothing is written locally; the
/// donation is recorded once the payment is confirmed.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>> {
    let event_id = request.donation_event_id.trim();
    let donor_id = request
        .donor_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let (event, donor) = {
        let conn = state.db.get()?;
        let event = queries::get_donation_event_by_id(&conn, event_id)?
            .or_not_found(msg::EVENT_NOT_FOUND)?;
        let donor = match donor_id {
            Some(id) => Some(
                queries::get_user_by_id(&conn, id)?
                    .ok_or_else(|| AppError::BadRequest(msg::UNKNOWN_DONOR.into()))?,
            ),
            None => None,
        };
        (event, donor)
    };

    let success_url = with_session_placeholder(
        request
            .success_url
            .as_deref()
            .unwrap_or(&format!("{}/donation/success", state.frontend_url)),
    );
    let cancel_url = request
        .cancel_url
        .clone()
        .unwrap_or_else(|| format!("{}/donate/{}", state.frontend_url, event.id));

    let checkout = CheckoutRequest {
        amount_cents: request.amount_cents,
        currency: state.currency.clone(),
        product_name: format!("Donation to {}", event.title),
        description: format!("Supporting {}", event.title),
        image_url: event.image_url.clone(),
        customer_email: donor.as_ref().map(|d| d.email.clone()),
        success_url,
        cancel_url,
        metadata: DonationMetadata::new(&event.id, request.is_anonymous, donor_id),
    };

    let session = state.gateway.create_checkout_session(&checkout).await?;

    tracing::info!(
        "Created {} checkout {} for event {} ({} {})",
        state.gateway.provider_name(),
        session.id,
        event.id,
        checkout.amount_cents,
        checkout.currency
    );

    Ok(Json(CreateCheckoutResponse {
        url: session.url,
        session_id: session.id,
    }))
}
