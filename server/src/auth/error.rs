//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No caller identity on the request.
    #[error("Missing user identity header")]
    MissingUserHeader,

    /// Caller identity present but not a UUID.
    #[error("Invalid user identity header")]
    InvalidUserHeader,
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match &self {
            Self::MissingUserHeader => "MISSING_AUTH",
            Self::InvalidUserHeader => "INVALID_AUTH_HEADER",
        };

        let body = Json(ErrorResponse {
            code: code.to_string(),
            error: self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
