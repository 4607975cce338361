//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// `PostgreSQL` connection URL. In-memory stores are used when unset.
    pub database_url: Option<String>,

    /// Externally reachable base URL, used to build capture URLs
    pub public_base_url: String,

    /// Telegram Bot API base URL (overridable for tests and self-hosted API servers)
    pub telegram_api_base: String,

    /// Upper bound on a single delivery call in seconds (default: 10)
    pub delivery_timeout_secs: u64,

    /// Maximum accepted inbound payload size in bytes (default: 1MB)
    pub max_payload_size: usize,

    /// Capture session lifetime in seconds (default: 300 = 5 min)
    pub capture_session_ttl_secs: i64,

    /// How long terminal capture sessions are kept before removal (default: 600)
    pub capture_retention_grace_secs: i64,

    /// Capture cleanup sweep period in seconds (default: 60)
    pub capture_sweep_interval_secs: u64,

    /// Pending capture sessions allowed per user (default: 5)
    pub capture_max_pending_per_user: usize,

    /// Include internal error detail in HTTP responses (development only)
    pub expose_internal_errors: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "production".into());

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
            telegram_api_base: env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".into())
                .trim_end_matches('/')
                .to_string(),
            delivery_timeout_secs: parse_var("DELIVERY_TIMEOUT_SECS", 10)?,
            max_payload_size: parse_var("MAX_PAYLOAD_SIZE", 1024 * 1024)?, // 1MB
            capture_session_ttl_secs: parse_var("CAPTURE_SESSION_TTL_SECS", 300)?,
            capture_retention_grace_secs: parse_var("CAPTURE_RETENTION_GRACE_SECS", 600)?,
            capture_sweep_interval_secs: parse_var("CAPTURE_SWEEP_INTERVAL_SECS", 60)?,
            capture_max_pending_per_user: parse_var("CAPTURE_MAX_PENDING_PER_USER", 5)?,
            expose_internal_errors: app_env.eq_ignore_ascii_case("development"),
        })
    }

    /// Delivery timeout as a [`Duration`].
    #[must_use]
    pub const fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    /// Cleanup sweep period. Never zero.
    #[must_use]
    pub fn capture_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.capture_sweep_interval_secs.max(1))
    }

    /// Check if a database is configured.
    #[must_use]
    pub const fn has_database(&self) -> bool {
        self.database_url.is_some()
    }

    /// Database URL required by the server binary.
    ///
    /// Without Postgres nothing can register webhooks, and in-memory traces
    /// would grow with every request.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to run the server")
    }

    /// Create a default configuration for testing.
    ///
    /// No database: all stores are in memory. The Telegram base URL points at
    /// a closed local port so any accidental delivery fails fast.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            database_url: None,
            public_base_url: "http://relay.test".into(),
            telegram_api_base: "http://127.0.0.1:9".into(),
            delivery_timeout_secs: 2,
            max_payload_size: 64 * 1024,
            capture_session_ttl_secs: 300,
            capture_retention_grace_secs: 600,
            capture_sweep_interval_secs: 60,
            capture_max_pending_per_user: 5,
            expose_internal_errors: true,
        }
    }
}

/// Parse an optional numeric environment variable, falling back to `default`.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_has_no_database() {
        let config = Config::default_for_test();
        assert!(!config.has_database());
        assert_eq!(config.delivery_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn server_requires_database_url() {
        let mut config = Config::default_for_test();
        let err = config.require_database_url().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        config.database_url = Some("postgres://relay@localhost/relay".into());
        assert_eq!(
            config.require_database_url().unwrap(),
            "postgres://relay@localhost/relay"
        );
    }

    #[test]
    fn parse_var_falls_back_to_default() {
        let value: u64 = parse_var("RELAY_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
