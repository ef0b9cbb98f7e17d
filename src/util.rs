//! Shared request helpers.

use axum::http::HeaderMap;

/// Placeholder Stripe substitutes with the checkout session id on redirect.
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Absolute http(s) URL with a non-empty host part.
pub fn is_http_url(url: &str) -> bool {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
}

/// Append `session_id={CHECKOUT_SESSION_ID}` to a success URL unless it
/// already carries the placeholder. The braces stay literal.
pub fn with_session_placeholder(url: &str) -> String {
    if url.contains(CHECKOUT_SESSION_PLACEHOLDER) {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}session_id={CHECKOUT_SESSION_PLACEHOLDER}")
}
