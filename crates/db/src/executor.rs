//! Query execution with deadlines and outcome tracking.
//!
//! [`Database`] is the single shared handle the repositories use. Each call
//! races the query against its deadline, reports the outcome to the
//! [`PerformanceTracker`] exactly once, and maps a missed deadline to the
//! distinct [`DbError::Timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use folio_core::types::Record;

use crate::error::{DbError, DbResult};
use crate::row::row_to_record;
use crate::statement::{SqlParam, Statement};
use crate::tracker::PerformanceTracker;
use crate::DbPool;

// ---------------------------------------------------------------------------
// Runner seam
// ---------------------------------------------------------------------------

/// The seam between the executor and the database client.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run a statement and decode every returned row.
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Record>, sqlx::Error>;

    /// Run a statement and report the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error>;
}

/// [`QueryRunner`] over a shared Postgres pool.
pub struct PgRunner {
    pool: DbPool,
}

impl PgRunner {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryRunner for PgRunner {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Record>, sqlx::Error> {
        let rows = bind_all(statement).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error> {
        let result = bind_all(statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn bind_all(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match param {
            SqlParam::Text(value) | SqlParam::Json(value) => query.bind(value.as_deref()),
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Bool(value) => query.bind(*value),
        };
    }
    query
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// Which deadline a query runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Single-row reads, listings and writes.
    Primary,
    /// Dependent reads issued while hydrating a parent.
    Child,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryTimeouts {
    pub primary: Duration,
    pub child: Duration,
}

impl QueryTimeouts {
    pub fn for_kind(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::Primary => self.primary,
            QueryKind::Child => self.child,
        }
    }
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            primary: Duration::from_secs(15),
            child: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Shared database handle: one runner, one tracker, fixed deadlines.
///
/// Every call is an independent autocommitting statement. Nothing here
/// wraps multiple statements in a transaction, and concurrent updates to
/// the same row are last-write-wins.
#[derive(Clone)]
pub struct Database {
    runner: Arc<dyn QueryRunner>,
    tracker: Arc<PerformanceTracker>,
    timeouts: QueryTimeouts,
}

impl Database {
    pub fn new(pool: DbPool, tracker: Arc<PerformanceTracker>, timeouts: QueryTimeouts) -> Self {
        Self::with_runner(Arc::new(PgRunner::new(pool)), tracker, timeouts)
    }

    pub fn with_runner(
        runner: Arc<dyn QueryRunner>,
        tracker: Arc<PerformanceTracker>,
        timeouts: QueryTimeouts,
    ) -> Self {
        Self {
            runner,
            tracker,
            timeouts,
        }
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub async fn fetch_all(
        &self,
        operation: &str,
        kind: QueryKind,
        statement: &Statement,
    ) -> DbResult<Vec<Record>> {
        self.run(operation, kind, self.runner.fetch_all(statement))
            .await
    }

    /// Like [`fetch_all`](Self::fetch_all) but keeps only the first row.
    pub async fn fetch_optional(
        &self,
        operation: &str,
        kind: QueryKind,
        statement: &Statement,
    ) -> DbResult<Option<Record>> {
        let rows = self.fetch_all(operation, kind, statement).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn execute(&self, operation: &str, statement: &Statement) -> DbResult<u64> {
        self.run(operation, QueryKind::Primary, self.runner.execute(statement))
            .await
    }

    async fn run<T, F>(&self, operation: &str, kind: QueryKind, query: F) -> DbResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let deadline = self.timeouts.for_kind(kind);
        let started = Instant::now();

        match tokio::time::timeout(deadline, query).await {
            Ok(Ok(value)) => {
                self.tracker.record(operation, started, true, None);
                Ok(value)
            }
            Ok(Err(err)) => {
                let message = err.to_string();
                tracing::warn!(operation, error = %message, "Query failed");
                self.tracker.record(operation, started, false, Some(&message));
                Err(DbError::Query(err))
            }
            Err(_) => {
                let err = DbError::Timeout {
                    operation: operation.to_string(),
                    after: deadline,
                };
                let message = err.to_string();
                tracing::warn!(operation, timeout_ms = deadline.as_millis() as u64, "Query timed out");
                self.tracker.record(operation, started, false, Some(&message));
                Err(err)
            }
        }
    }
}
