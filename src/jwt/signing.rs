use std::collections::HashSet;

use jwt_simple::prelude::*;

use super::{SessionClaims, VerifiedToken};
use crate::error::{AppError, Result};
use crate::models::User;

pub const TOKEN_ISSUER: &str = "donation-tracker";

/// Issues and verifies HS256 session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: HS256Key,
    ttl_days: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_days: u64) -> Self {
        Self {
            key: HS256Key::from_bytes(secret),
            ttl_days,
        }
    }

    /// Sign a token for `user`, valid for the configured number of days.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims::with_custom_claims(
            SessionClaims { role: user.role },
            Duration::from_days(self.ttl_days),
        )
        .with_issuer(TOKEN_ISSUER)
        .with_subject(&user.id);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a bearer token. Any failure is reported as Unauthorized.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken> {
        let mut allowed_issuers = HashSet::new();
        allowed_issuers.insert(TOKEN_ISSUER.to_string());

        let options = VerificationOptions {
            allowed_issuers: Some(allowed_issuers),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<SessionClaims>(token, Some(options))
            .map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                AppError::Unauthorized
            })?;

        let user_id = claims.subject.ok_or(AppError::Unauthorized)?;
        Ok(VerifiedToken {
            user_id,
            role: claims.custom.role,
        })
    }
}
