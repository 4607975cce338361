//! Capture Session API Handlers
//!
//! Session management is scoped to the calling user; payload submission is
//! open to anyone holding the capture URL.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use super::session::{CaptureError, CaptureSession, CaptureStatus, CreatedSession};
use crate::api::AppState;
use crate::auth::AuthUser;

/// Reply to a payload submission.
#[derive(Debug, Serialize)]
pub struct CaptureReceipt {
    pub ok: bool,
    pub status: CaptureStatus,
}

/// Fetch a session owned by `user`. Sessions of other users look absent.
fn owned_session(state: &AppState, user: AuthUser, session_id: &str) -> Result<CaptureSession, CaptureError> {
    let session = state.captures.get_session(session_id)?;
    if session.user_id != user.id {
        return Err(CaptureError::SessionNotFound);
    }
    Ok(session)
}

/// POST /`api/capture-sessions`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<CreatedSession>), CaptureError> {
    let created = state.captures.create_session(user.id)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /`api/capture-sessions/{id}`
#[instrument(skip(state, user, session_id), fields(user_id = %user.id))]
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<CaptureSession>, CaptureError> {
    owned_session(&state, user, &session_id).map(Json)
}

/// DELETE /`api/capture-sessions/{id}`
#[instrument(skip(state, user, session_id), fields(user_id = %user.id))]
pub async fn cancel_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<CaptureSession>, CaptureError> {
    owned_session(&state, user, &session_id)?;
    state.captures.cancel_session(&session_id).map(Json)
}

/// POST /`api/capture/{id}`
#[instrument(skip(state, session_id, body), fields(size = body.len()))]
pub async fn submit_payload(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<CaptureReceipt>, CaptureError> {
    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| CaptureError::InvalidPayload(e.to_string()))?;

    let session = state.captures.complete_session(&session_id, payload)?;
    Ok(Json(CaptureReceipt {
        ok: true,
        status: session.status,
    }))
}
