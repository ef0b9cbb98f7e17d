use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query, ValidJson};
use crate::middleware::AuthContext;
use crate::models::{CreateDonationEvent, DonationEvent, EventStatus, UpdateDonationEvent};
use crate::pagination::{Paginated, PaginationQuery};

/// Optional `?status=active|completed` filter for event listings.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub status: Option<EventStatus>,
}

pub async fn create_donation_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ValidJson(input): ValidJson<CreateDonationEvent>,
) -> Result<(StatusCode, Json<DonationEvent>)> {
    let conn = state.db.get()?;
    let event = queries::create_donation_event(&conn, &input, Some(ctx.user_id()))?;

    tracing::info!("Admin {} created donation event {}", ctx.user_id(), event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_donation_events(
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

pub async fn get_donation_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DonationEvent>> {
    let conn = state.db.get()?;
    let event = queries::get_donation_event_by_id(&conn, &id)?.or_not_found(msg::EVENT_NOT_FOUND)?;
    Ok(Json(event))
}

pub async fn update_donation_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<UpdateDonationEvent>,
) -> Result<Json<DonationEvent>> {
    let conn = state.db.get()?;
    let event = queries::update_donation_event(&conn, &id, &input)?
        .or_not_found(msg::EVENT_NOT_FOUND)?;

    tracing::info!(
        "Admin {} updated donation event {} (goal {}, raised {}, {})",
        ctx.user_id(),
        event.id,
        event.goal_cents,
        event.raised_cents,
        event.status.as_ref()
    );
    Ok(Json(event))
}

pub async fn delete_donation_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    if !queries::delete_donation_event(&conn, &id)? {
        return Err(AppError::NotFound(msg::EVENT_NOT_FOUND.into()));
    }

    tracing::info!("Admin {} deleted donation event {}", ctx.user_id(), id);
    Ok(Json(serde_json::json!({ "success": true })))
}
