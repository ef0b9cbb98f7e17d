pub mod admin;
pub mod auth;
pub mod donors;
pub mod payments;
pub mod public;

use axum::Router;

use crate::db::AppState;

/// Every route the service exposes, with state applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .merge(payments::router())
        .merge(auth::router(state.clone()))
        .merge(donors::router(state.clone()))
        .merge(admin::router(state.clone()))
        .with_state(state)
}
