//! Webhook Configuration Source
//!
//! Configuration is owned by the management side; the pipeline only looks
//! it up. The Postgres implementation lives in [`super::queries`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use super::types::WebhookConfig;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored webhook is malformed: {0}")]
    Malformed(String),
}

/// Read-only lookup of webhook configuration.
#[async_trait]
pub trait WebhookSource: Send + Sync {
    /// Find by the public id used in inbound URLs. Disabled webhooks are
    /// returned; the caller decides what disabled means.
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<WebhookConfig>, SourceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookConfig>, SourceError>;
}

/// In-memory source, used when no database is configured and in tests.
#[derive(Default, Clone)]
pub struct InMemoryWebhookSource {
    by_id: Arc<DashMap<Uuid, WebhookConfig>>,
    public_ids: Arc<DashMap<String, Uuid>>,
}

impl InMemoryWebhookSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a webhook.
    pub fn upsert(&self, config: WebhookConfig) {
        if let Some(previous) = self.by_id.get(&config.id) {
            if previous.public_id != config.public_id {
                self.public_ids.remove(&previous.public_id);
            }
        }
        self.public_ids.insert(config.public_id.clone(), config.id);
        self.by_id.insert(config.id, config);
    }

    pub fn remove(&self, id: Uuid) -> Option<WebhookConfig> {
        let (_, config) = self.by_id.remove(&id)?;
        self.public_ids.remove(&config.public_id);
        Some(config)
    }
}

#[async_trait]
impl WebhookSource for InMemoryWebhookSource {
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<WebhookConfig>, SourceError> {
        let Some(id) = self.public_ids.get(public_id).map(|r| *r) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|c| c.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookConfig>, SourceError> {
        Ok(self.by_id.get(&id).map(|c| c.clone()))
    }
}
