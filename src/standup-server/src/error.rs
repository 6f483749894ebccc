//! Error types for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use standup_slack::SlackError;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller may not run the command. Carries the text shown to them.
    #[error("{0}")]
    Authorization(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The messaging platform failed.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Platform(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Result type for the server.
pub type AppResult<T> = Result<T, AppError>;

impl From<SlackError> for AppError {
    fn from(error: SlackError) -> Self {
        match error {
            SlackError::Config(_) | SlackError::Internal(_) => Self::Internal(error.to_string()),
            _ => Self::Platform(error.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
