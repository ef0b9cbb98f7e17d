use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared across handlers.
pub mod msg {
    pub const EVENT_NOT_FOUND: &str = "Donation event not found";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const SESSION_NOT_FOUND: &str = "Payment session not found";

    pub const AMOUNT_REQUIRED: &str = "Valid amount is required";
    pub const AMOUNT_TOO_LARGE: &str = "Amount exceeds the maximum allowed per donation";
    pub const EVENT_ID_REQUIRED: &str = "Donation event ID is required";
    pub const SESSION_ID_REQUIRED: &str = "Session ID is required";
    pub const INVALID_SESSION_ID: &str = "Invalid session ID";
    pub const UNKNOWN_DONOR: &str = "Donor does not exist";
    pub const INVALID_REDIRECT_URL: &str = "Redirect URLs must be absolute http(s) URLs";
    pub const METADATA_MISSING_EVENT: &str = "Payment session is missing its donation event";
    pub const NEGATIVE_PAYMENT: &str = "Payment amount cannot be negative";

    pub const EMAIL_EMPTY: &str = "Email is required";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
    pub const NAME_EMPTY: &str = "Name is required";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
    pub const USER_EXISTS: &str = "User already exists";
    pub const EMAIL_TAKEN: &str = "Email already exists";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const CANNOT_DELETE_SELF: &str = "Cannot delete yourself";

    pub const TITLE_EMPTY: &str = "Please provide a donation title";
    pub const DETAILS_EMPTY: &str = "Please provide donation details";
    pub const GOAL_NOT_POSITIVE: &str = "Goal amount must be greater than zero";
    pub const EVENT_HAS_DONATIONS: &str =
        "Cannot delete a donation event that has recorded donations";

    pub const INVALID_SIGNATURE_FORMAT: &str = "Invalid signature format";
    pub const INVALID_TIMESTAMP_IN_SIGNATURE: &str = "Invalid timestamp in signature";
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Login failure; the same message for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The gateway reports the checkout session as not paid (carries its status).
    #[error("Payment not completed: {0}")]
    PaymentNotCompleted(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when the error is a UNIQUE constraint violation from SQLite.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }

    /// True when the error is a FOREIGN KEY constraint violation from SQLite.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some(msg::INVALID_CREDENTIALS.to_string()),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            // Duplicate keys surface as plain bad requests (e.g. re-registration).
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "Conflict", Some(msg.clone())),
            AppError::PaymentNotCompleted(status) => (
                StatusCode::BAD_REQUEST,
                "Payment not completed",
                Some(format!("Payment status: {}", status)),
            ),
            AppError::Gateway(e) => {
                tracing::error!("Payment gateway error: {}", e);
                (StatusCode::BAD_GATEWAY, "Payment gateway error", None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Converts `Option<T>` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}
