//! Trace persistence.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::RequestTrace;

#[derive(Error, Debug)]
pub enum TraceSinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only destination for finished request traces.
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn append(&self, trace: &RequestTrace) -> Result<(), TraceSinkError>;

    async fn get(&self, correlation_id: Uuid) -> Result<Option<RequestTrace>, TraceSinkError>;
}

/// Keeps traces in memory, keyed by correlation id.
#[derive(Default, Clone)]
pub struct InMemoryTraceSink {
    traces: Arc<DashMap<Uuid, RequestTrace>>,
}

impl InMemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Traces recorded for one webhook public id, oldest first.
    pub fn for_public_id(&self, public_id: &str) -> Vec<RequestTrace> {
        let mut traces: Vec<RequestTrace> = self
            .traces
            .iter()
            .filter(|t| t.public_id == public_id)
            .map(|t| t.clone())
            .collect();
        traces.sort_by_key(|t| t.started_at);
        traces
    }
}

#[async_trait]
impl TraceSink for InMemoryTraceSink {
    async fn append(&self, trace: &RequestTrace) -> Result<(), TraceSinkError> {
        self.traces.insert(trace.correlation_id, trace.clone());
        Ok(())
    }

    async fn get(&self, correlation_id: Uuid) -> Result<Option<RequestTrace>, TraceSinkError> {
        Ok(self.traces.get(&correlation_id).map(|t| t.clone()))
    }
}

/// Stores traces in the `request_logs` table, one row per request with the
/// stage events as JSONB.
#[derive(Clone)]
pub struct PgTraceSink {
    pool: PgPool,
}

impl PgTraceSink {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TraceSink for PgTraceSink {
    async fn append(&self, trace: &RequestTrace) -> Result<(), TraceSinkError> {
        let events = serde_json::to_value(&trace.events)?;
        let metadata = serde_json::to_value(&trace.metadata)?;
        let completion = trace.completion.as_ref();

        sqlx::query(
            r"
            INSERT INTO request_logs
                (correlation_id, public_id, webhook_id, metadata, started_at,
                 events, status_code, elapsed_ms, outcome)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(trace.correlation_id)
        .bind(&trace.public_id)
        .bind(trace.webhook_id)
        .bind(metadata)
        .bind(trace.started_at)
        .bind(events)
        .bind(completion.map(|c| i32::from(c.status_code)))
        .bind(completion.map(|c| c.elapsed_ms as i64))
        .bind(completion.map(|c| c.outcome.as_str()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, correlation_id: Uuid) -> Result<Option<RequestTrace>, TraceSinkError> {
        let row: Option<TraceRow> = sqlx::query_as(
            r"
            SELECT correlation_id, public_id, webhook_id, metadata, started_at,
                   events, status_code, elapsed_ms, outcome
            FROM request_logs
            WHERE correlation_id = $1
            ",
        )
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RequestTrace::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct TraceRow {
    correlation_id: Uuid,
    public_id: String,
    webhook_id: Option<Uuid>,
    metadata: serde_json::Value,
    started_at: chrono::DateTime<chrono::Utc>,
    events: serde_json::Value,
    status_code: Option<i32>,
    elapsed_ms: Option<i64>,
    outcome: Option<String>,
}

impl TryFrom<TraceRow> for RequestTrace {
    type Error = TraceSinkError;

    fn try_from(row: TraceRow) -> Result<Self, Self::Error> {
        let completion = match (row.status_code, row.elapsed_ms, row.outcome) {
            (Some(status), Some(elapsed), Some(outcome)) => Some(super::Completion {
                status_code: status as u16,
                elapsed_ms: elapsed as u64,
                outcome,
            }),
            _ => None,
        };

        Ok(Self {
            correlation_id: row.correlation_id,
            public_id: row.public_id,
            webhook_id: row.webhook_id,
            metadata: serde_json::from_value(row.metadata)?,
            started_at: row.started_at,
            events: serde_json::from_value(row.events)?,
            completion,
        })
    }
}
