//! PSK-based authentication for the admin-facing API routes.
//!
//! The key may arrive either as an `x-api-key` header or as a bearer token.
//! Comparison is constant-time to mitigate timing attacks.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::ErrorResponse;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    match provided_key(&request) {
        Some(key) if constant_time_compare(&key, &expected) => next.run(request).await,
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing API key"),
    }
}

/// Pull the caller's key from the `x-api-key` header, falling back to an
/// `Authorization: Bearer` token.
fn provided_key(request: &Request) -> Option<String> {
    let headers = request.headers();

    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_constant_time_compare_empty() {
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("", "not-empty"));
    }
}
