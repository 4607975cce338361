//! Message Delivery
//!
//! Sends rendered text to the Telegram Bot API and classifies the outcome.
//!
//! Exactly one HTTP attempt is made per call. The caller records the outcome
//! whatever it is; nothing here retries or queues.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::escape::EscapedText;
use super::types::DeliveryTarget;

/// Longest response body kept on an outcome.
const MAX_RESPONSE_TEXT: usize = 2000;

/// Why a delivery did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// No response: connection refused, DNS, TLS, reset.
    Network,
    /// The bounded wait was exceeded.
    Timeout,
    /// A response arrived with an error status or `"ok": false`.
    Rejected,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub status_code: Option<u16>,
    pub success: bool,
    pub response_text: Option<String>,
    pub error_kind: Option<DeliveryErrorKind>,
    pub latency_ms: u64,
}

impl DeliveryOutcome {
    fn failed(
        kind: DeliveryErrorKind,
        status_code: Option<u16>,
        response_text: Option<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            status_code,
            success: false,
            response_text,
            error_kind: Some(kind),
            latency_ms,
        }
    }

    /// Human readable reason taken from the API response, if any.
    pub fn description(&self) -> Option<String> {
        let text = self.response_text.as_deref()?;
        serde_json::from_str::<ApiResponse>(text)
            .ok()
            .and_then(|r| r.description)
            .or_else(|| Some(text.to_string()))
    }
}

/// Local faults that make a delivery impossible to attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Delivery client misconfigured: {0}")]
    Misconfigured(String),
}

/// Sends a message to a chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(
        &self,
        target: &DeliveryTarget,
        text: &EscapedText,
    ) -> Result<DeliveryOutcome, DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: Option<bool>,
    description: Option<String>,
}

/// Bot API `sendMessage` client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
}

impl TelegramClient {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Misconfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, bot_token: &str) -> Result<reqwest::Url, DeliveryError> {
        if bot_token.is_empty() || bot_token.contains(['/', '?', '#']) || bot_token.contains(char::is_whitespace) {
            return Err(DeliveryError::Misconfigured(
                "bot token is empty or contains URL delimiters".to_string(),
            ));
        }
        let url = format!("{}/bot{}/sendMessage", self.api_base, bot_token);
        reqwest::Url::parse(&url)
            .map_err(|e| DeliveryError::Misconfigured(format!("invalid API URL: {e}")))
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    #[tracing::instrument(skip(self, target, text), fields(chat_id = %target.chat_id))]
    async fn send_message(
        &self,
        target: &DeliveryTarget,
        text: &EscapedText,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let url = self.endpoint(&target.bot_token)?;

        let mut body = serde_json::json!({
            "chat_id": target.chat_id,
            "text": text.as_str(),
        });
        if let Some(mode) = text.mode().api_name() {
            body["parse_mode"] = mode.into();
        }
        if let Some(thread_id) = target.message_thread_id {
            body["message_thread_id"] = thread_id.into();
        }

        let start = Instant::now();
        let result = self.http.post(url).json(&body).send().await;
        let elapsed = || start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                let kind = classify_transport_error(&e);
                let message = redact(&e.to_string(), &target.bot_token);
                warn!(error = %message, ?kind, "Message delivery failed without a response");
                return Ok(DeliveryOutcome::failed(kind, None, Some(message), elapsed()));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                let kind = classify_transport_error(&e);
                let message = redact(&e.to_string(), &target.bot_token);
                warn!(status = status.as_u16(), error = %message, "Failed to read API response");
                return Ok(DeliveryOutcome::failed(
                    kind,
                    Some(status.as_u16()),
                    Some(message),
                    elapsed(),
                ));
            }
        };
        let latency_ms = elapsed();
        let response_text = Some(truncate(&redact(&text, &target.bot_token)));

        let api_ok = serde_json::from_str::<ApiResponse>(&text)
            .ok()
            .and_then(|r| r.ok)
            .unwrap_or(true);

        if status.is_success() && api_ok {
            debug!(status = status.as_u16(), latency_ms, "Message delivered");
            Ok(DeliveryOutcome {
                status_code: Some(status.as_u16()),
                success: true,
                response_text,
                error_kind: None,
                latency_ms,
            })
        } else {
            warn!(status = status.as_u16(), latency_ms, "Messaging API rejected message");
            Ok(DeliveryOutcome::failed(
                DeliveryErrorKind::Rejected,
                Some(status.as_u16()),
                response_text,
                latency_ms,
            ))
        }
    }
}

fn classify_transport_error(err: &reqwest::Error) -> DeliveryErrorKind {
    if err.is_timeout() {
        DeliveryErrorKind::Timeout
    } else {
        DeliveryErrorKind::Network
    }
}

/// Remove the bot token from text that may echo the request URL.
fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        text.to_string()
    } else {
        text.replace(token, "<redacted>")
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_RESPONSE_TEXT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::escape::{escape, ParseMode};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123456:test-token";

    fn target() -> DeliveryTarget {
        DeliveryTarget {
            bot_token: TOKEN.into(),
            chat_id: "-100200".into(),
            message_thread_id: None,
        }
    }

    fn client(base: &str, timeout_ms: u64) -> TelegramClient {
        TelegramClient::new(base, Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn successful_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_partial_json(json!({
                "chat_id": "-100200",
                "text": "Event: test",
                "parse_mode": "MarkdownV2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), 2000)
            .send_message(&target(), &escape(ParseMode::MarkdownV2, "Event: test"))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
        assert_eq!(outcome.error_kind, None);
    }

    #[tokio::test]
    async fn plain_text_omits_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server.uri(), 2000)
            .send_message(&target(), &escape(ParseMode::None, "hi"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), 2000)
            .send_message(&target(), &escape(ParseMode::None, "hi"))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(400));
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Rejected));
        assert_eq!(outcome.description().as_deref(), Some("Bad Request: chat not found"));
    }

    #[tokio::test]
    async fn ok_false_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), 2000)
            .send_message(&target(), &escape(ParseMode::None, "hi"))
            .await
            .unwrap();

        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Rejected));
    }

    #[tokio::test]
    async fn slow_api_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_millis(1500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), 200)
            .send_message(&target(), &escape(ParseMode::None, "hi"))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, None);
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Timeout));
    }

    #[tokio::test]
    async fn unreachable_api_is_network_error_without_token() {
        let outcome = client("http://127.0.0.1:9", 2000)
            .send_message(&target(), &escape(ParseMode::None, "hi"))
            .await
            .unwrap();

        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Network));
        assert!(!outcome.response_text.unwrap_or_default().contains(TOKEN));
    }

    #[tokio::test]
    async fn malformed_token_is_misconfiguration() {
        let mut bad = target();
        bad.bot_token = "12/../admin".into();

        let err = client("http://127.0.0.1:9", 2000)
            .send_message(&bad, &escape(ParseMode::None, "hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Misconfigured(_)));
    }
}
