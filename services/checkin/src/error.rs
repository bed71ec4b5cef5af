//! Error taxonomy for the check-in service
//!
//! Every fallible operation in the auth core resolves to one of these kinds;
//! handlers and middleware pattern-match on the kind rather than catching an
//! untyped error. Each kind maps to exactly one HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Custom error type for the check-in service
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested event does not exist
    #[error("Event not found")]
    EventNotFound,

    /// Wrong password, or an event that does not exist on the auth path
    #[error("Invalid password")]
    InvalidCredentials,

    /// No session cookie, or the token resolved to no live session
    #[error("Authentication required")]
    Unauthenticated,

    /// Session is valid but bound to a different event
    #[error("Unauthorized for this event")]
    Forbidden,

    /// Mutating request without a matching anti-forgery token
    #[error("Missing or invalid CSRF token")]
    CsrfRejected,

    /// The attendee does not exist or belongs to another event
    #[error("Attendee not found for this event")]
    AttendeeNotFound,

    /// Malformed or incomplete request payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Write conflicts with existing data, e.g. a duplicate attendee name
    #[error("{0}")]
    Conflict(String),

    /// Underlying persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Anything else that should surface as a 500
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::EventNotFound => (StatusCode::NOT_FOUND, "Event not found".to_string()),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid password".to_string())
            }
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Unauthorized for this event".to_string(),
            ),
            ApiError::CsrfRejected => (
                StatusCode::FORBIDDEN,
                "Missing or invalid CSRF token".to_string(),
            ),
            ApiError::AttendeeNotFound => (
                StatusCode::NOT_FOUND,
                "Attendee not found for this event".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Storage(e) => {
                error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;
