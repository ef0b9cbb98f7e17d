use axum::{Router, extract::State, routing::get};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::models::DonationEvent;
use crate::pagination::{Paginated, PaginationQuery};

use super::admin::EventFilter;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_public_events(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Paginated<DonationEvent>>> {
    let conn = state.db.get()?;
    let (limit, offset) = (page.limit(), page.offset());
    let (events, total) =
        queries::list_donation_events_paginated(&conn, filter.status, limit, offset)?;
    Ok(Json(Paginated::new(events, total, limit, offset)))
}

pub async fn get_public_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DonationEvent>> {
    let conn = state.db.get()?;
    let event = queries::get_donation_event_by_id(&conn, &id)?.or_not_found(msg::EVENT_NOT_FOUND)?;
    Ok(Json(event))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/public/donation-events", get(list_public_events))
        .route("/api/public/donation-events/{id}", get(get_public_event))
}
