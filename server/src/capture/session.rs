//! Capture Session Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state. Only `Pending` may change, and only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    Pending,
    Completed,
    Cancelled,
    Expired,
}

impl CaptureStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Snapshot of a capture session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSession {
    pub session_id: String,
    pub user_id: Uuid,
    pub status: CaptureStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// When the session left `Pending`. Equals `expires_at` for expiry.
    pub finished_at: Option<DateTime<Utc>>,
    pub captured_payload: Option<serde_json::Value>,
}

impl CaptureSession {
    pub(super) fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == CaptureStatus::Pending && now >= self.expires_at
    }

    /// Mark expired if the deadline has passed. Returns whether it changed.
    pub(super) fn expire_if_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_overdue(now) {
            self.status = CaptureStatus::Expired;
            self.finished_at = Some(self.expires_at);
            true
        } else {
            false
        }
    }

    /// Error describing why a terminal session cannot transition.
    pub(super) fn terminal_error(&self) -> Option<CaptureError> {
        match self.status {
            CaptureStatus::Pending => None,
            CaptureStatus::Completed => Some(CaptureError::SessionAlreadyCompleted),
            CaptureStatus::Cancelled => Some(CaptureError::SessionCancelled),
            CaptureStatus::Expired => Some(CaptureError::SessionExpired),
        }
    }
}

/// Returned by `create_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub capture_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Capture session errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture session not found")]
    SessionNotFound,

    #[error("Capture session has expired")]
    SessionExpired,

    #[error("Capture session already received a payload")]
    SessionAlreadyCompleted,

    #[error("Capture session was cancelled")]
    SessionCancelled,

    #[error("Too many pending capture sessions (max: {max})")]
    TooManySessions { max: usize },

    #[error("Captured payload is not valid JSON: {0}")]
    InvalidPayload(String),
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::SessionNotFound => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            Self::SessionExpired => (StatusCode::GONE, "SESSION_EXPIRED"),
            Self::SessionAlreadyCompleted => (StatusCode::CONFLICT, "SESSION_ALREADY_COMPLETED"),
            Self::SessionCancelled => (StatusCode::CONFLICT, "SESSION_CANCELLED"),
            Self::TooManySessions { .. } => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_SESSIONS"),
            Self::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "code": code,
        }));

        (status, body).into_response()
    }
}
