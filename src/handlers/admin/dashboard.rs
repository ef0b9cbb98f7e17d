use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::DashboardStats;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
}

pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    let conn = state.db.get()?;
    let stats = queries::get_dashboard_stats(&conn)?;
    Ok(Json(DashboardResponse { stats }))
}
