mod dashboard;
mod donation_events;
mod users;

pub use dashboard::*;
pub use donation_events::*;
pub use users::*;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::db::AppState;
use crate::middleware::require_admin;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/dashboard", get(get_dashboard))
        // Donation events
        .route(
            "/api/admin/donation-events",
            get(list_donation_events).post(create_donation_event),
        )
        .route(
            "/api/admin/donation-events/{id}",
            get(get_donation_event)
                .put(update_donation_event)
                .delete(delete_donation_event),
        )
        // Users
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", get(get_user).delete(delete_user))
        .route("/api/admin/users/{id}/role", put(update_user_role))
        .layer(middleware::from_fn_with_state(state, require_admin))
}
