use axum::{Extension, Router, extract::State, middleware, routing::get};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::{AuthContext, require_auth};
use crate::models::DonorDonation;

/// The caller's own donations, newest first.
pub async fn list_my_donations(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<DonorDonation>>> {
    let conn = state.db.get()?;
    let donations = queries::list_donations_for_donor(&conn, ctx.user_id())?;
    Ok(Json(donations))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users/donations", get(list_my_donations))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
