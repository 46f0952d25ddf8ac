//! Small helpers for identifier validation and request metadata.

use regex::Regex;

/// Normalize an identifier (email) for lookup.
pub(super) fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_identifier(identifier: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(identifier))
}

/// Password payloads arrive pre-hashed from the client: 64 hex characters.
pub(super) fn valid_password_hash(payload: &str) -> bool {
    Regex::new(r"^[0-9a-fA-F]{64}$").is_ok_and(|regex| regex.is_match(payload))
}

/// Extract a client IP for rate limiting and audit from common proxy
/// headers.
pub(super) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
