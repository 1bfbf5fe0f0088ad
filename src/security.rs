use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

/// Header carrying the service API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison for API keys.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Key presented by a client, from `X-API-Key` or `Authorization: Bearer`.
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(key);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Whether a request may proceed. Always true when no key is configured.
pub fn verify_api_key(expected: Option<&str>, headers: &HeaderMap) -> bool {
    match expected {
        None => true,
        Some(expected) => extract_api_key(headers)
            .map(|presented| constant_time_compare(presented, expected))
            .unwrap_or(false),
    }
}
