//! HTTP error mapping for radiovote-server
//!
//! Validation problems → 400, duplicate vote → 409, anything else → 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const ALREADY_VOTED_MESSAGE: &str = "You have already voted on this track";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field (400)
    #[error("{0}")]
    Validation(String),

    /// Identity already voted on this track (409)
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<radiovote_common::Error> for ApiError {
    fn from(err: radiovote_common::Error) -> Self {
        match err {
            radiovote_common::Error::InvalidInput(msg) => ApiError::Validation(msg),
            radiovote_common::Error::AlreadyVoted { .. } => {
                ApiError::Conflict(ALREADY_VOTED_MESSAGE.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(detail) => {
                // Storage details stay in the log
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
