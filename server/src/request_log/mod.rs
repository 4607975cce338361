//! Request Logging
//!
//! Every inbound webhook request gets a [`RequestTrace`]: a correlation id
//! and the ordered outcome of each pipeline stage. Traces are emitted to
//! `tracing` as stages happen and appended to a [`TraceSink`] once the
//! request finishes, including requests that stopped early.

mod sink;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use sink::{InMemoryTraceSink, PgTraceSink, TraceSink, TraceSinkError};

use crate::webhooks::types::RequestMetadata;

/// Pipeline stages, in the only order they may be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    ConfigResolved,
    Validated,
    Formatted,
    Delivered,
    Completed,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ConfigResolved => "config_resolved",
            Self::Validated => "validated",
            Self::Formatted => "formatted",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
        }
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub ok: bool,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

/// Final record written when a request leaves the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub status_code: u16,
    pub elapsed_ms: u64,
    /// `ok` or the error code that ended the request.
    pub outcome: String,
}

/// Ordered record of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTrace {
    pub correlation_id: Uuid,
    pub public_id: String,
    pub webhook_id: Option<Uuid>,
    pub metadata: RequestMetadata,
    pub started_at: DateTime<Utc>,
    pub events: Vec<StageEvent>,
    pub completion: Option<Completion>,
}

impl RequestTrace {
    /// Start a trace for a request that just arrived.
    pub fn begin(public_id: &str, metadata: RequestMetadata) -> Self {
        let mut trace = Self {
            correlation_id: Uuid::new_v4(),
            public_id: public_id.to_string(),
            webhook_id: None,
            metadata,
            started_at: Utc::now(),
            events: Vec::new(),
            completion: None,
        };
        trace.record(Stage::Received, true, None);
        trace
    }

    /// Record a stage outcome and mirror it to the log.
    ///
    /// Stages must advance; a stage at or before the last recorded one is
    /// ignored with a warning.
    pub fn record(&mut self, stage: Stage, ok: bool, detail: Option<String>) {
        if let Some(last) = self.events.last() {
            if stage <= last.stage {
                tracing::warn!(
                    correlation_id = %self.correlation_id,
                    stage = stage.as_str(),
                    last = last.stage.as_str(),
                    "Ignoring out-of-order stage event"
                );
                return;
            }
        }

        if ok {
            tracing::info!(
                correlation_id = %self.correlation_id,
                public_id = %self.public_id,
                webhook_id = ?self.webhook_id,
                stage = stage.as_str(),
                detail = detail.as_deref().unwrap_or(""),
                "Webhook stage passed"
            );
        } else {
            tracing::warn!(
                correlation_id = %self.correlation_id,
                public_id = %self.public_id,
                webhook_id = ?self.webhook_id,
                stage = stage.as_str(),
                detail = detail.as_deref().unwrap_or(""),
                "Webhook stage failed"
            );
        }

        self.events.push(StageEvent {
            stage,
            ok,
            detail,
            at: Utc::now(),
        });
    }

    /// Close the trace with the response status.
    pub fn finish(&mut self, status_code: u16, elapsed_ms: u64, outcome: &str) {
        self.record(Stage::Completed, status_code < 400, Some(outcome.to_string()));
        self.completion = Some(Completion {
            status_code,
            elapsed_ms,
            outcome: outcome.to_string(),
        });
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.events.iter().map(|e| e.stage).collect()
    }

    pub const fn is_finished(&self) -> bool {
        self.completion.is_some()
    }
}

/// Hands out traces and persists them when requests finish.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Arc<dyn TraceSink>,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    pub fn begin(&self, public_id: &str, metadata: RequestMetadata) -> RequestTrace {
        RequestTrace::begin(public_id, metadata)
    }

    /// Persist a finished trace. A sink failure is logged with the full
    /// trace so the record is not lost outright.
    pub async fn commit(&self, trace: &RequestTrace) {
        if let Err(e) = self.sink.append(trace).await {
            tracing::error!(
                correlation_id = %trace.correlation_id,
                error = %e,
                trace = ?trace,
                "Failed to persist request trace"
            );
        }
    }

    pub fn sink(&self) -> &Arc<dyn TraceSink> {
        &self.sink
    }
}
