use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::crypto::{hash_password, verify_password};
use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, ValidJson};
use crate::middleware::{AuthContext, require_auth};
use crate::models::{CreateUser, Role, UpdateProfile, User};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub university: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    /// Only present after an update, replacing the caller's token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            university: user.university,
            address: user.address,
            role: user.role,
            token: None,
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateUser>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let password_hash = hash_password(&input.password)?;

    let conn = state.db.get()?;
    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::Conflict(msg::USER_EXISTS.into()));
    }
    let user = queries::create_user(&conn, &input, &password_hash, Role::Donor)?;

    tracing::info!("Registered user {}", user.id);

    let token = state.tokens.issue(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let conn = state.db.get()?;

    // Same error for unknown email and wrong password
    let user = queries::get_user_by_email(&conn, &input.email)?
        .filter(|user| verify_password(&input.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::debug!("Failed login attempt");
            AppError::InvalidCredentials
        })?;

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse::new(user, token)))
}

pub async fn get_profile(Extension(ctx): Extension<AuthContext>) -> Json<ProfileResponse> {
    Json(ctx.user.into())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ValidJson(input): ValidJson<UpdateProfile>,
) -> Result<Json<ProfileResponse>> {
    let conn = state.db.get()?;

    if let Some(ref email) = input.email
        && let Some(existing) = queries::get_user_by_email(&conn, email)?
        && existing.id != ctx.user_id()
    {
        return Err(AppError::Conflict(msg::EMAIL_TAKEN.into()));
    }

    let user = queries::update_profile(&conn, ctx.user_id(), &input)?
        .or_not_found(msg::USER_NOT_FOUND)?;
    let token = state.tokens.issue(&user)?;

    let mut profile = ProfileResponse::from(user);
    profile.token = Some(token);
    Ok(Json(profile))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .layer(middleware::from_fn_with_state(state, require_auth))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}
