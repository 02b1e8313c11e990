//! Persistence layer for the portfolio site.
//!
//! [`executor::Database`] wraps the pool with per-query deadlines and
//! outcome tracking; the repositories in [`repositories`] build on it.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod models;
pub mod repositories;
pub mod retry;
pub mod row;
pub mod statement;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use config::DbConfig;
pub use error::{DbError, DbResult};
pub use executor::{Database, QueryKind, QueryTimeouts};
pub use tracker::PerformanceTracker;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> DbResult<()> {
    sqlx::migrate!("../../db/migrations").run(pool).await?;
    tracing::info!("Migrations applied");
    Ok(())
}
