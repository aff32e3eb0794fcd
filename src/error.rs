use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// HTTP-facing error taxonomy. Every variant maps to one status code and a
/// user-facing message; connection and internal failures keep their detail
/// for the log only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database unreachable: {0}")]
    Connection(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Connection(detail) => {
                tracing::error!(error = %detail, "database unreachable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server could not reach the database.".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred on the server.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => {
                ApiError::Conflict("Email already registered.".to_string())
            }
            StoreError::NotFound => ApiError::NotFound("User not found.".to_string()),
            StoreError::Unavailable(detail) => ApiError::Connection(detail),
            StoreError::Backend(err) => ApiError::Internal(err.to_string()),
        }
    }
}
