//! Webhook API Handlers
//!
//! Inbound webhook intake and the template change notification.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, FromRequestParts, Path, State};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::StatusCode;
use http_body_util::LengthLimitError;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::types::{ProcessResult, RequestMetadata};
use crate::api::AppState;

/// Header carrying the shared secret of a protected webhook.
pub const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

/// Transport facts about the caller.
#[derive(Debug, Clone, Default)]
pub struct CallerInfo {
    remote_addr: Option<String>,
    user_agent: Option<String>,
    token: Option<String>,
}

impl CallerInfo {
    fn into_metadata(self, content_length: usize) -> RequestMetadata {
        RequestMetadata {
            remote_addr: self.remote_addr,
            user_agent: self.user_agent,
            content_length,
            token: self.token,
        }
    }
}

impl<S> FromRequestParts<S> for CallerInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let remote_addr = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            });

        Ok(Self {
            remote_addr,
            user_agent: header(USER_AGENT.as_str()),
            token: header(WEBHOOK_TOKEN_HEADER),
        })
    }
}

/// POST /`api/webhooks/{public_id}`
///
/// The body is read here rather than by an extractor so that an oversized
/// payload still goes through the pipeline and is recorded.
#[instrument(skip(state, caller, body))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    caller: CallerInfo,
    body: Body,
) -> ProcessResult {
    let limit = state.config.max_payload_size;
    let (raw, content_length) = match axum::body::to_bytes(body, limit).await {
        Ok(raw) => {
            let len = raw.len();
            (raw, len)
        }
        Err(e) => {
            let too_large = e.into_inner().is::<LengthLimitError>();
            warn!(%public_id, too_large, "Could not read webhook body");
            (Bytes::new(), if too_large { limit.saturating_add(1) } else { 0 })
        }
    };

    let metadata = caller.into_metadata(content_length);
    state.processor.process(&public_id, raw, metadata).await
}

/// POST /`internal/webhooks/{id}/template-changed`
#[instrument(skip(state))]
pub async fn template_changed(
    State(state): State<AppState>,
    Path(webhook_id): Path<Uuid>,
) -> Result<StatusCode, ProcessResult> {
    state
        .processor
        .template_changed(webhook_id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| e.to_response(Uuid::new_v4(), state.config.expose_internal_errors))
}
