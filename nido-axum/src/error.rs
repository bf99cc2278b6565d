use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use nido::error::{Error, UserError};

/// Transport-level failure, mapped from the engine's error kinds.
///
/// All credential failures arrive here already collapsed into
/// `Unauthorized`; this layer never re-distinguishes them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Store or network failure; the client may retry
    #[error("Service temporarily unavailable")]
    Unavailable,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => ApiError::BadRequest(e.to_string()),
            Error::Auth(_) => ApiError::Unauthorized,
            Error::User(UserError::NotFound) => ApiError::NotFound("User not found".to_string()),
            Error::User(UserError::ChildNotFound(name)) => {
                ApiError::NotFound(format!("Child not found: {name}"))
            }
            Error::User(UserError::AlreadyExists) => {
                ApiError::Conflict("User already exists".to_string())
            }
            Error::User(UserError::ChildAlreadyExists(name)) => {
                ApiError::Conflict(format!("Child already exists: {name}"))
            }
            Error::User(UserError::Conflict) => {
                ApiError::Conflict("Record was modified concurrently".to_string())
            }
            Error::Store(e) => {
                tracing::error!(cause = %e, "Credential store failure");
                ApiError::Unavailable
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            ApiError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
