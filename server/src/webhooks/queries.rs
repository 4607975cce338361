//! Webhook Database Queries
//!
//! Read-side lookups of webhook configuration joined with its bot.
//! Uses runtime queries (`sqlx::query_as`) to avoid requiring a live
//! database at compile time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::escape::ParseMode;
use super::source::{SourceError, WebhookSource};
use super::types::{DeliveryTarget, WebhookConfig};

const SELECT_WEBHOOK: &str = r"
    SELECT w.id, w.public_id, w.template, w.parse_mode,
           b.token AS bot_token, w.chat_id, w.message_thread_id,
           w.protected, w.secret_token,
           (w.disabled OR b.disabled) AS disabled,
           w.payload_schema,
           GREATEST(w.updated_at, b.updated_at) AS updated_at
    FROM webhooks w
    JOIN bots b ON b.id = w.bot_id
";

#[derive(Debug, sqlx::FromRow)]
struct WebhookRow {
    id: Uuid,
    public_id: String,
    template: String,
    parse_mode: Option<String>,
    bot_token: String,
    chat_id: String,
    message_thread_id: Option<i64>,
    protected: bool,
    secret_token: Option<String>,
    disabled: bool,
    payload_schema: Option<serde_json::Value>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WebhookRow> for WebhookConfig {
    type Error = SourceError;

    fn try_from(row: WebhookRow) -> Result<Self, Self::Error> {
        if row.protected && row.secret_token.as_deref().is_none_or(str::is_empty) {
            return Err(SourceError::Malformed(format!(
                "webhook {} is protected but has no secret token",
                row.id
            )));
        }

        Ok(Self {
            id: row.id,
            public_id: row.public_id,
            template: row.template,
            parse_mode: row
                .parse_mode
                .as_deref()
                .map_or(ParseMode::None, ParseMode::from_name),
            target: DeliveryTarget {
                bot_token: row.bot_token,
                chat_id: row.chat_id,
                message_thread_id: row.message_thread_id,
            },
            protected: row.protected,
            secret_token: row.secret_token,
            disabled: row.disabled,
            payload_schema: row.payload_schema,
            updated_at: row.updated_at,
        })
    }
}

/// Webhook source backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgWebhookSource {
    pool: PgPool,
}

impl PgWebhookSource {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookSource for PgWebhookSource {
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<WebhookConfig>, SourceError> {
        let row = sqlx::query_as::<_, WebhookRow>(&format!("{SELECT_WEBHOOK} WHERE w.public_id = $1"))
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(WebhookConfig::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookConfig>, SourceError> {
        let row = sqlx::query_as::<_, WebhookRow>(&format!("{SELECT_WEBHOOK} WHERE w.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(WebhookConfig::try_from).transpose()
    }
}
