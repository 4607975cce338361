//! Daily Request Statistics
//!
//! Per-day counters kept for each webhook and for the whole service
//! (`webhook_id = None`). Every finished request updates both rows.
//!
//! Increments are atomic per key: the in-memory store adds to atomics under
//! a shared entry, the Postgres store issues a single upsert that adds to
//! the existing row.

mod store;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::{InMemoryStatsStore, PgStatsStore, StatsError, StatsStore};

/// Row key: one row per day per webhook, plus one global row per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatKey {
    pub date: NaiveDate,
    pub webhook_id: Option<Uuid>,
}

/// Amounts added to a row by one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub requests: u64,
    pub successes: u64,
    pub validation_failures: u64,
    pub delivery_failures: u64,
    pub elapsed_ms: u64,
}

impl StatDelta {
    /// Delta for a single finished request.
    ///
    /// `delivered` is `Some(ok)` when a delivery was attempted.
    pub fn for_request(status_code: u16, elapsed_ms: u64, validated: bool, delivered: Option<bool>) -> Self {
        let success = (200..300).contains(&status_code) && delivered == Some(true);
        Self {
            requests: 1,
            successes: u64::from(success),
            validation_failures: u64::from(!validated),
            delivery_failures: u64::from(delivered == Some(false)),
            elapsed_ms,
        }
    }
}

/// Snapshot of one stats row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub request_count: u64,
    pub success_count: u64,
    pub validation_failures: u64,
    pub delivery_failures: u64,
    pub total_elapsed_ms: u64,
}

/// Applies request outcomes to the stats store.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn StatsStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Record one request against today's webhook row and global row.
    ///
    /// Store failures are logged; statistics never change a request's result.
    pub async fn update_stats(
        &self,
        webhook_id: Option<Uuid>,
        status_code: u16,
        elapsed_ms: u64,
        validated: bool,
        delivered: Option<bool>,
    ) {
        let date = Utc::now().date_naive();
        let delta = StatDelta::for_request(status_code, elapsed_ms, validated, delivered);

        let mut keys = vec![StatKey {
            date,
            webhook_id: None,
        }];
        if webhook_id.is_some() {
            keys.push(StatKey { date, webhook_id });
        }

        for key in keys {
            if let Err(e) = self.store.increment(&key, &delta).await {
                tracing::error!(
                    webhook_id = ?key.webhook_id,
                    date = %key.date,
                    error = %e,
                    "Failed to update daily stats"
                );
            }
        }
    }

    pub async fn daily(&self, date: NaiveDate, webhook_id: Option<Uuid>) -> Result<DailyStat, StatsError> {
        Ok(self
            .store
            .get(&StatKey { date, webhook_id })
            .await?
            .unwrap_or_default())
    }
}
