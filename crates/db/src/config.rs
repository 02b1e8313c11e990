use std::str::FromStr;
use std::time::Duration;

use folio_core::error::CoreError;

use crate::executor::QueryTimeouts;

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    /// Forwarded to the client pool; sizing policy lives with the deployment.
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Deadline for primary reads and writes (default: `15`).
    pub query_timeout_secs: u64,
    /// Deadline for dependent child reads during hydration (default: `10`).
    pub child_query_timeout_secs: u64,
    /// Queries slower than this are kept in the slow-query window.
    pub slow_query_threshold_ms: u64,
}

impl DbConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default  |
    /// |----------------------------|----------|
    /// | `DATABASE_URL`             | required |
    /// | `DB_MAX_CONNECTIONS`       | `10`     |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`  | `10`     |
    /// | `QUERY_TIMEOUT_SECS`       | `15`     |
    /// | `CHILD_QUERY_TIMEOUT_SECS` | `10`     |
    /// | `SLOW_QUERY_THRESHOLD_MS`  | `1000`   |
    pub fn from_env() -> Result<Self, CoreError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| CoreError::Validation("DATABASE_URL must be set".into()))?;

        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 10)?,
            query_timeout_secs: env_or("QUERY_TIMEOUT_SECS", 15)?,
            child_query_timeout_secs: env_or("CHILD_QUERY_TIMEOUT_SECS", 10)?,
            slow_query_threshold_ms: env_or("SLOW_QUERY_THRESHOLD_MS", 1000)?,
        })
    }

    pub fn timeouts(&self) -> QueryTimeouts {
        QueryTimeouts {
            primary: Duration::from_secs(self.query_timeout_secs),
            child: Duration::from_secs(self.child_query_timeout_secs),
        }
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, CoreError> {
    parse_var(key, std::env::var(key).ok(), default)
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, CoreError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has an invalid value: {value}"))),
    }
}
