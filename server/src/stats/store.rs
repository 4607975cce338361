//! Stats persistence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use thiserror::Error;

use super::{DailyStat, StatDelta, StatKey};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counter store keyed by day and webhook.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Add `delta` to the row, creating it if needed. Must not lose
    /// concurrent increments to the same key.
    async fn increment(&self, key: &StatKey, delta: &StatDelta) -> Result<(), StatsError>;

    async fn get(&self, key: &StatKey) -> Result<Option<DailyStat>, StatsError>;
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    successes: AtomicU64,
    validation_failures: AtomicU64,
    delivery_failures: AtomicU64,
    elapsed_ms: AtomicU64,
}

impl Counters {
    fn add(&self, delta: &StatDelta) {
        self.requests.fetch_add(delta.requests, Ordering::Relaxed);
        self.successes.fetch_add(delta.successes, Ordering::Relaxed);
        self.validation_failures
            .fetch_add(delta.validation_failures, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(delta.delivery_failures, Ordering::Relaxed);
        self.elapsed_ms.fetch_add(delta.elapsed_ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DailyStat {
        DailyStat {
            request_count: self.requests.load(Ordering::Relaxed),
            success_count: self.successes.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            total_elapsed_ms: self.elapsed_ms.load(Ordering::Relaxed),
        }
    }
}

/// In-memory counters. Rows are created on first use and never removed.
#[derive(Default, Clone)]
pub struct InMemoryStatsStore {
    rows: Arc<DashMap<StatKey, Arc<Counters>>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn increment(&self, key: &StatKey, delta: &StatDelta) -> Result<(), StatsError> {
        let counters = self.rows.entry(*key).or_default().clone();
        counters.add(delta);
        Ok(())
    }

    async fn get(&self, key: &StatKey) -> Result<Option<DailyStat>, StatsError> {
        Ok(self.rows.get(key).map(|c| c.snapshot()))
    }
}

/// Stats in the `daily_stats` table. Each increment is one upsert, so the
/// database serializes concurrent writers on the row.
#[derive(Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn increment(&self, key: &StatKey, delta: &StatDelta) -> Result<(), StatsError> {
        sqlx::query(
            r"
            INSERT INTO daily_stats
                (stat_date, webhook_id, request_count, success_count,
                 validation_failures, delivery_failures, total_elapsed_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stat_date, webhook_id) DO UPDATE SET
                request_count = daily_stats.request_count + EXCLUDED.request_count,
                success_count = daily_stats.success_count + EXCLUDED.success_count,
                validation_failures = daily_stats.validation_failures + EXCLUDED.validation_failures,
                delivery_failures = daily_stats.delivery_failures + EXCLUDED.delivery_failures,
                total_elapsed_ms = daily_stats.total_elapsed_ms + EXCLUDED.total_elapsed_ms,
                updated_at = NOW()
            ",
        )
        .bind(key.date)
        .bind(key.webhook_id)
        .bind(delta.requests as i64)
        .bind(delta.successes as i64)
        .bind(delta.validation_failures as i64)
        .bind(delta.delivery_failures as i64)
        .bind(delta.elapsed_ms as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &StatKey) -> Result<Option<DailyStat>, StatsError> {
        let row: Option<(i64, i64, i64, i64, i64)> = sqlx::query_as(
            r"
            SELECT request_count, success_count, validation_failures,
                   delivery_failures, total_elapsed_ms
            FROM daily_stats
            WHERE stat_date = $1 AND webhook_id IS NOT DISTINCT FROM $2
            ",
        )
        .bind(key.date)
        .bind(key.webhook_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(requests, successes, validation_failures, delivery_failures, elapsed)| DailyStat {
                request_count: requests as u64,
                success_count: successes as u64,
                validation_failures: validation_failures as u64,
                delivery_failures: delivery_failures as u64,
                total_elapsed_ms: elapsed as u64,
            },
        ))
    }
}
