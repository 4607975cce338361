//! Payload Capture
//!
//! Short-lived sessions that record one live webhook payload so a user can
//! build a template against real data.

mod cleanup;
pub mod handlers;
mod manager;
mod session;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use cleanup::spawn_cleanup_task;
pub use manager::{CaptureSessionManager, CaptureSettings, SweepReport};
pub use session::{CaptureError, CaptureSession, CaptureStatus, CreatedSession};

/// Capture routes.
///
/// - POST /api/capture-sessions - Open a session (caller from `X-User-Id`)
/// - GET /api/capture-sessions/{id} - Session status and captured payload
/// - DELETE /api/capture-sessions/{id} - Cancel a pending session
/// - POST /api/capture/{id} - Submit the payload (no auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/capture-sessions", post(handlers::create_session))
        .route(
            "/api/capture-sessions/{id}",
            get(handlers::get_session).delete(handlers::cancel_session),
        )
        .route("/api/capture/{id}", post(handlers::submit_payload))
}
