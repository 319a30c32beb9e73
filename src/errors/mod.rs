//! Error handling module for the Venue backend.
//!
//! Maps application errors to HTTP status codes and the `{ "error": message }`
//! envelope consumed by the mobile app and admin tooling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Missing or invalid caller-supplied parameter
    Validation(String),
    /// Resource not found
    NotFound(String),
    /// The app-version revision index has zero (or more than one) entry for a
    /// version expected to be bootstrapped before queries occur. Surfaced as a
    /// server error rather than a 404.
    RevisionIndex(String),
    /// A conditional revision write lost to a concurrent ingestion
    Conflict(String),
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RevisionIndex(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::RevisionIndex(msg)
            | AppError::Conflict(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
