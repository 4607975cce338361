//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::capture::{self, CaptureSessionManager, CaptureSettings};
use crate::config::Config;
use crate::request_log::{InMemoryTraceSink, PgTraceSink, RequestLogger, TraceSink};
use crate::stats::{InMemoryStatsStore, PgStatsStore, StatsAggregator, StatsStore};
use crate::webhooks::{
    self,
    delivery::{DeliveryError, MessageSender, TelegramClient},
    formatter::MessageFormatter,
    queries::PgWebhookSource,
    source::{InMemoryWebhookSource, WebhookSource},
    templates::TemplateCache,
    validation::{JsonSchemaValidator, PayloadValidator},
    WebhookProcessor,
};

/// Storage backends for the pipeline.
#[derive(Clone)]
pub struct Stores {
    pub webhooks: Arc<dyn WebhookSource>,
    pub traces: Arc<dyn TraceSink>,
    pub stats: Arc<dyn StatsStore>,
}

impl Stores {
    /// Postgres-backed stores.
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            webhooks: Arc::new(PgWebhookSource::new(pool.clone())),
            traces: Arc::new(PgTraceSink::new(pool.clone())),
            stats: Arc::new(PgStatsStore::new(pool.clone())),
        }
    }

    /// In-memory stores around the given webhook source.
    pub fn in_memory(webhooks: InMemoryWebhookSource) -> Self {
        Self {
            webhooks: Arc::new(webhooks),
            traces: Arc::new(InMemoryTraceSink::new()),
            stats: Arc::new(InMemoryStatsStore::new()),
        }
    }
}

/// Configuration for creating [`AppState`].
pub struct AppStateConfig {
    pub config: Config,
    pub db: Option<PgPool>,
    pub stores: Stores,
    /// Delivery client. Defaults to a [`TelegramClient`] built from `config`.
    pub sender: Option<Arc<dyn MessageSender>>,
    /// Payload validator. Defaults to JSON Schema.
    pub validator: Option<Arc<dyn PayloadValidator>>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (absent when running in memory)
    pub db: Option<PgPool>,
    /// Server configuration
    pub config: Arc<Config>,
    /// Webhook processing pipeline
    pub processor: WebhookProcessor,
    /// Capture session registry
    pub captures: Arc<CaptureSessionManager>,
    /// Backends the pipeline writes to
    pub stores: Stores,
}

impl AppState {
    /// Create new application state.
    pub fn new(cfg: AppStateConfig) -> Result<Self, DeliveryError> {
        let AppStateConfig {
            config,
            db,
            stores,
            sender,
            validator,
        } = cfg;

        let sender = match sender {
            Some(sender) => sender,
            None => Arc::new(TelegramClient::new(
                &config.telegram_api_base,
                config.delivery_timeout(),
            )?),
        };
        let validator = validator.unwrap_or_else(|| Arc::new(JsonSchemaValidator));

        let processor = WebhookProcessor::new(
            Arc::clone(&stores.webhooks),
            validator,
            MessageFormatter::new(Arc::new(TemplateCache::new())),
            sender,
            RequestLogger::new(Arc::clone(&stores.traces)),
            StatsAggregator::new(Arc::clone(&stores.stats)),
            config.expose_internal_errors,
        )
        .with_max_payload_size(config.max_payload_size);
        let captures = Arc::new(CaptureSessionManager::new(CaptureSettings::from_config(&config)));

        Ok(Self {
            db,
            config: Arc::new(config),
            processor,
            captures,
            stores,
        })
    }

    /// Check if a database is attached.
    #[must_use]
    pub const fn has_database(&self) -> bool {
        self.db.is_some()
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_payload_size = state.config.max_payload_size;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(webhooks::router())
        .merge(webhooks::internal_router())
        .merge(capture::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_payload_size))
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether stores are backed by `PostgreSQL`
    database: bool,
    /// Capture sessions waiting for a payload
    active_capture_sessions: usize,
    /// Compiled templates held in memory
    cached_templates: usize,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: state.has_database(),
        active_capture_sessions: state.captures.active_sessions(),
        cached_templates: state.processor.formatter().templates().len(),
    })
}
