use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Custom claims carried by session tokens.
/// Standard claims (iss, sub, iat, exp) are handled by jwt-simple; `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Role at issue time. Informational only: authorization re-reads the user row.
    pub role: Role,
}

/// A token that passed signature, issuer and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user_id: String,
    pub role: Role,
}
