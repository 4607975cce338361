//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router with in-memory stores, plus a `wiremock` stand-in for the Telegram
//! Bot API.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use relay_server::api::{create_router, AppState, AppStateConfig, Stores};
use relay_server::config::Config;
use relay_server::request_log::TraceSink;
use relay_server::webhooks::escape::ParseMode;
use relay_server::webhooks::source::InMemoryWebhookSource;
use relay_server::webhooks::types::{DeliveryTarget, WebhookConfig};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bot token used by every test webhook.
pub const BOT_TOKEN: &str = "123456:integration-token";

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub webhooks: InMemoryWebhookSource,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a test app with default test config and no reachable Telegram.
    pub async fn new() -> Self {
        Self::with_config(Config::default_for_test()).await
    }

    /// Create a test app that delivers to `telegram`.
    pub async fn with_telegram(telegram: &MockServer) -> Self {
        let mut config = Config::default_for_test();
        config.telegram_api_base = telegram.uri();
        Self::with_config(config).await
    }

    /// Create a test app with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let webhooks = InMemoryWebhookSource::new();
        let state = AppState::new(AppStateConfig {
            config: config.clone(),
            db: None,
            stores: Stores::in_memory(webhooks.clone()),
            sender: None,
            validator: None,
        })
        .expect("Failed to build app state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            webhooks,
            config: Arc::new(config),
        }
    }

    /// Register a webhook and return its configuration.
    pub fn add_webhook(&self, public_id: &str, template: &str, parse_mode: ParseMode) -> WebhookConfig {
        let config = WebhookConfig {
            id: Uuid::new_v4(),
            public_id: public_id.to_string(),
            template: template.to_string(),
            parse_mode,
            target: DeliveryTarget {
                bot_token: BOT_TOKEN.to_string(),
                chat_id: "-1001234".to_string(),
                message_thread_id: None,
            },
            protected: false,
            secret_token: None,
            disabled: false,
            payload_schema: None,
            updated_at: Utc::now(),
        };
        self.webhooks.upsert(config.clone());
        config
    }

    /// Replace a webhook's configuration.
    pub fn update_webhook(&self, config: WebhookConfig) {
        self.webhooks.upsert(config);
    }

    /// Look up a committed request trace by its correlation id.
    pub async fn trace(&self, correlation_id: Uuid) -> Option<relay_server::request_log::RequestTrace> {
        self.state
            .stores
            .traces
            .get(correlation_id)
            .await
            .expect("trace lookup failed")
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// POST a raw body to a webhook's public URL.
    pub async fn post_webhook(&self, public_id: &str, body: &str) -> Response<Body> {
        self.oneshot(
            Self::request(Method::POST, &format!("/api/webhooks/{public_id}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

// ============================================================================
// Telegram stub
// ============================================================================

/// Start a mock Bot API that accepts every `sendMessage` call.
pub async fn telegram_ok() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/sendMessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"message_id": 1}
        })))
        .mount(&server)
        .await;
    server
}

/// Bodies of every `sendMessage` call the stub received.
pub async fn sent_messages(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}

// ============================================================================
// Response helpers
// ============================================================================

/// Parse the response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response is not valid JSON")
}
