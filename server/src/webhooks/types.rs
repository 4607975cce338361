//! Webhook Types
//!
//! Configuration consumed by the pipeline, pipeline results, and the error
//! taxonomy mapped onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::escape::ParseMode;

/// Where a rendered message is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTarget {
    /// Bot API token. Never logged.
    #[serde(skip_serializing)]
    pub bot_token: String,
    /// Chat id or `@channelusername`.
    pub chat_id: String,
    /// Forum topic to post into, if any.
    pub message_thread_id: Option<i64>,
}

/// Webhook configuration as owned by the management side. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: Uuid,
    /// Opaque id used in the inbound URL.
    pub public_id: String,
    pub template: String,
    pub parse_mode: ParseMode,
    pub target: DeliveryTarget,
    /// Requests must present `secret_token` when set.
    pub protected: bool,
    #[serde(skip_serializing)]
    pub secret_token: Option<String>,
    pub disabled: bool,
    /// JSON Schema the payload must satisfy.
    pub payload_schema: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

/// Transport facts about an inbound request, recorded with its trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub content_length: usize,
    /// Value of the `X-Webhook-Token` header. Not serialized.
    #[serde(skip)]
    pub token: Option<String>,
}

/// JSON body returned to webhook senders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessResponse {
    pub ok: bool,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<String>,
}

/// Result of one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub status: StatusCode,
    pub body: ProcessResponse,
}

impl IntoResponse for ProcessResult {
    fn into_response(self) -> Response {
        let request_id = self.body.request_id.to_string();
        let mut response = (self.status, Json(self.body)).into_response();
        if let Ok(v) = request_id.parse() {
            response.headers_mut().insert("x-request-id", v);
        }
        response
    }
}

/// Terminal pipeline failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Webhook not found or disabled")]
    ConfigNotFoundOrDisabled,
    #[error("Missing or invalid webhook token")]
    Unauthorized,
    #[error("Payload failed validation")]
    PayloadInvalid(Vec<String>),
    #[error("Template could not be rendered")]
    TemplateRenderFailure(Vec<String>),
    /// Detail stays in the trace; the response only carries the code.
    #[error("Could not reach the messaging API")]
    DeliveryNetworkError(String),
    #[error("Messaging API did not answer in time")]
    DeliveryTimeout,
    #[error("Messaging API rejected the message (HTTP {status}): {description}")]
    DeliveryRejected { status: u16, description: String },
    #[error("Internal error: {0}")]
    InternalFault(String),
}

impl WebhookError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigNotFoundOrDisabled => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadInvalid(_) | Self::TemplateRenderFailure(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::DeliveryNetworkError(_) | Self::DeliveryRejected { .. } => StatusCode::BAD_GATEWAY,
            Self::DeliveryTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::InternalFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFoundOrDisabled => "WEBHOOK_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::PayloadInvalid(_) => "PAYLOAD_INVALID",
            Self::TemplateRenderFailure(_) => "TEMPLATE_RENDER_FAILURE",
            Self::DeliveryNetworkError(_) => "DELIVERY_NETWORK_ERROR",
            Self::DeliveryTimeout => "DELIVERY_TIMEOUT",
            Self::DeliveryRejected { .. } => "DELIVERY_REJECTED",
            Self::InternalFault(_) => "INTERNAL_ERROR",
        }
    }

    /// Build the response body. Internal detail is only included when
    /// `expose_internal` is set.
    pub fn to_response(&self, request_id: Uuid, expose_internal: bool) -> ProcessResult {
        let (message, details) = match self {
            Self::PayloadInvalid(v) | Self::TemplateRenderFailure(v) => {
                (self.to_string(), v.clone())
            }
            Self::InternalFault(detail) if expose_internal => {
                (self.to_string(), vec![detail.clone()])
            }
            Self::InternalFault(_) => ("Internal server error".to_string(), Vec::new()),
            _ => (self.to_string(), Vec::new()),
        };

        ProcessResult {
            status: self.status_code(),
            body: ProcessResponse {
                ok: false,
                request_id,
                error: Some(self.code().to_string()),
                message: Some(message),
                details,
            },
        }
    }
}
