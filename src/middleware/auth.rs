use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::AppError;
use crate::models::{Role, User};
use crate::util::extract_bearer_token;

/// The authenticated caller, inserted into request extensions by the auth layers.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Resolve the bearer token to a live user row.
///
/// The role comes from the database rather than the token, so demotions and
/// deletions take effect before the token expires.
fn authenticate_from_request(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let verified = state.tokens.verify(token)?;

    let conn = state.db.get()?;
    queries::get_user_by_id(&conn, &verified.user_id)?.ok_or(AppError::Unauthorized)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_from_request(&state, request.headers())?;

    request.extensions_mut().insert(AuthContext { user });
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = AuthContext {
        user: authenticate_from_request(&state, request.headers())?,
    };

    if !ctx.role().can_manage_events() {
        tracing::debug!("User {} denied admin access", ctx.user_id());
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
