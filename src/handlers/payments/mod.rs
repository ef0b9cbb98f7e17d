mod checkout;
pub mod common;
mod verify;
mod webhook;

pub use checkout::*;
pub use verify::*;
pub use webhook::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/payments/create-checkout-session",
            post(create_checkout_session),
        )
        .route("/api/payments/webhook", post(handle_webhook))
        .route(
            "/api/payments/verify-session/{session_id}",
            get(verify_session),
        )
}
