use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthContext;
use crate::models::{Role, UpdateRole, User};
use crate::pagination::{Paginated, PaginationQuery};

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<Role>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Paginated<User>>> {
    let conn = state.db.get()?;
    let (limit, offset) = (page.limit(), page.offset());
    let (users, total) = queries::list_users_paginated(&conn, filter.role, limit, offset)?;
    Ok(Json(Paginated::new(users, total, limit, offset)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, &id)?.or_not_found(msg::USER_NOT_FOUND)?;
    Ok(Json(user))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(input): Json<UpdateRole>,
) -> Result<Json<User>> {
    let conn = state.db.get()?;
    let user = queries::update_user_role(&conn, &id, input.role)?
        .or_not_found(msg::USER_NOT_FOUND)?;

    tracing::info!(
        "Admin {} set role of {} to {}",
        ctx.user_id(),
        user.id,
        user.role.as_ref()
    );
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    if id == ctx.user_id() {
        return Err(AppError::BadRequest(msg::CANNOT_DELETE_SELF.into()));
    }

    let conn = state.db.get()?;
    if !queries::delete_user(&conn, &id)? {
        return Err(AppError::NotFound(msg::USER_NOT_FOUND.into()));
    }

    tracing::info!("Admin {} deleted user {}", ctx.user_id(), id);
    Ok(Json(serde_json::json!({ "success": true })))
}
