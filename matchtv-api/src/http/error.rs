// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Application error with HTTP status code
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Convert matchtv_core errors to HTTP errors.
///
/// Session failures map to the fixed status strings the pages display; the
/// underlying detail goes to the log, not the client.
impl From<matchtv_core::Error> for AppError {
    fn from(err: matchtv_core::Error) -> Self {
        use matchtv_core::Error;

        match err {
            Error::NotFound => AppError::not_found("Match not found"),
            Error::Unsupported(detail) => {
                tracing::debug!("Unsupported stream: {detail}");
                AppError::bad_request("Unsupported stream")
            }
            Error::Load(detail) => {
                tracing::warn!("Stream load failed: {detail}");
                AppError::bad_gateway("Stream error")
            }
            Error::MissingIdentifier => AppError::bad_request("Invalid match"),
            Error::InvalidInput(msg) => AppError::bad_request(msg),
            Error::Authentication(msg) => AppError::unauthorized(msg),
            Error::Database(e) => {
                tracing::error!("Database error: {e}");
                AppError::internal_server_error("Database error")
            }
            Error::Redis(e) => {
                tracing::error!("Redis error: {e}");
                AppError::internal_server_error("Service temporarily unavailable")
            }
            Error::Serialization(e) => {
                tracing::error!("Serialization error: {e}");
                AppError::internal_server_error("Data processing error")
            }
            Error::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                AppError::internal_server_error("Internal server error")
            }
        }
    }
}
