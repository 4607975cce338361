//! Webhook Relay
//!
//! Inbound webhooks are rendered through a per-webhook template, escaped for
//! the chat's parse mode, and sent as a Telegram message in one attempt.

mod context;
pub mod delivery;
pub mod escape;
pub mod formatter;
pub mod handlers;
pub mod processor;
pub mod queries;
pub mod source;
pub mod templates;
pub mod types;
pub mod validation;

use axum::{routing::post, Router};

use crate::api::AppState;

pub use context::json_to_context;
pub use processor::WebhookProcessor;
pub use types::{WebhookConfig, WebhookError};

/// Webhook intake routes.
///
/// - POST /api/webhooks/{public_id} - Process an inbound webhook
pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhooks/{public_id}", post(handlers::receive_webhook))
}

/// Internal notification routes, to be exposed on a private network only.
///
/// - POST /internal/webhooks/{id}/template-changed - Rebuild the cached template
pub fn internal_router() -> Router<AppState> {
    Router::new().route(
        "/internal/webhooks/{id}/template-changed",
        post(handlers::template_changed),
    )
}
