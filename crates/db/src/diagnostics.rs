//! Connectivity check and debug status report.
//!
//! Every introspection query runs through the [`Database`] executor, so it
//! is timed and shows up in the very metrics it reports.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use folio_core::types::{Record, Timestamp};

use crate::executor::{Database, QueryKind};
use crate::statement::Statement;
use crate::tracker::QueryMetrics;

/// Success rate (percent) below which the layer is reported as degraded.
const HEALTHY_SUCCESS_RATE: f64 = 95.0;
/// Mean latency (ms) above which the layer is reported as degraded.
const HEALTHY_AVERAGE_MS: f64 = 1000.0;

const SCHEMA_SQL: &str = "SELECT table_name::text AS table_name, COUNT(*)::bigint AS column_count \
     FROM information_schema.columns WHERE table_schema = 'public' \
     GROUP BY table_name ORDER BY table_name";
const SIZE_SQL: &str = "SELECT pg_size_pretty(pg_database_size(current_database()))::text AS size";
const ACTIVE_CONNECTIONS_SQL: &str =
    "SELECT COUNT(*)::bigint AS count FROM pg_stat_activity WHERE datname = current_database()";

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub table_name: String,
    pub column_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Nothing has been recorded yet.
    Idle,
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub status: HealthStatus,
    pub average_response_time_ms: f64,
    pub success_rate: f64,
    pub slow_query_count: usize,
}

impl PerformanceSummary {
    pub fn from_metrics(metrics: &QueryMetrics) -> Self {
        let status = if metrics.total_queries == 0 {
            HealthStatus::Idle
        } else if metrics.success_rate >= HEALTHY_SUCCESS_RATE
            && metrics.average_response_time_ms < HEALTHY_AVERAGE_MS
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            average_response_time_ms: metrics.average_response_time_ms,
            success_rate: metrics.success_rate,
            slow_query_count: metrics.slow_queries.len(),
        }
    }
}

/// Full diagnostic snapshot. Introspection fields are `None` when their
/// query failed.
#[derive(Debug, Clone, Serialize)]
pub struct DebugStatus {
    pub query_metrics: QueryMetrics,
    pub performance: PerformanceSummary,
    pub schema: Option<Vec<TableInfo>>,
    pub database_size: Option<String>,
    pub active_connections: Option<i64>,
    pub connection: ConnectionTest,
    pub generated_at: Timestamp,
}

/// Round-trip a trivial query and report how long it took.
pub async fn test_connection(db: &Database) -> ConnectionTest {
    let started = Instant::now();
    let outcome = db
        .fetch_all("test_connection", QueryKind::Primary, &Statement::new("SELECT 1"))
        .await;
    let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(_) => ConnectionTest {
            success: true,
            message: "Database connection successful".into(),
            response_time_ms,
        },
        Err(err) => {
            tracing::error!(error = %err, "Connection test failed");
            ConnectionTest {
                success: false,
                message: format!("Database connection failed: {err}"),
                response_time_ms,
            }
        }
    }
}

pub async fn debug_status(db: &Database) -> DebugStatus {
    let connection = test_connection(db).await;
    let (schema, database_size, active_connections) =
        tokio::join!(schema(db), database_size(db), active_connections(db));

    // Taken last so the introspection queries above are included.
    let query_metrics = db.tracker().snapshot();
    let performance = PerformanceSummary::from_metrics(&query_metrics);

    DebugStatus {
        query_metrics,
        performance,
        schema,
        database_size,
        active_connections,
        connection,
        generated_at: chrono::Utc::now(),
    }
}

async fn schema(db: &Database) -> Option<Vec<TableInfo>> {
    let rows = introspect(db, "debug.schema", SCHEMA_SQL).await?;
    Some(
        rows.iter()
            .filter_map(|row| {
                Some(TableInfo {
                    table_name: row.get("table_name")?.as_str()?.to_string(),
                    column_count: row.get("column_count").and_then(Value::as_i64).unwrap_or(0),
                })
            })
            .collect(),
    )
}

async fn database_size(db: &Database) -> Option<String> {
    let rows = introspect(db, "debug.database_size", SIZE_SQL).await?;
    rows.first()?.get("size")?.as_str().map(str::to_string)
}

async fn active_connections(db: &Database) -> Option<i64> {
    let rows = introspect(db, "debug.active_connections", ACTIVE_CONNECTIONS_SQL).await?;
    rows.first()?.get("count")?.as_i64()
}

async fn introspect(
    db: &Database,
    operation: &str,
    sql: &str,
) -> Option<Vec<Record>> {
    match db
        .fetch_all(operation, QueryKind::Primary, &Statement::new(sql))
        .await
    {
        Ok(rows) => Some(rows),
        Err(err) => {
            tracing::warn!(operation, error = %err, "Introspection query failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{record, ScriptedRunner};

    #[tokio::test]
    async fn connection_test_reports_success() {
        let runner = ScriptedRunner::new().on("SELECT 1", |_| Ok(vec![record(json!({"?column?": 1}))]));
        let db = runner.database();

        let result = test_connection(&db).await;

        assert!(result.success);
        assert_eq!(db.tracker().snapshot().recent_queries[0].operation, "test_connection");
    }

    #[tokio::test]
    async fn connection_test_reports_failure_without_erroring() {
        let runner = ScriptedRunner::new().on("SELECT 1", |_| Err(sqlx::Error::PoolTimedOut));
        let db = runner.database();

        let result = test_connection(&db).await;

        assert!(!result.success);
        assert!(result.message.starts_with("Database connection failed"));
    }

    #[tokio::test]
    async fn debug_status_tracks_its_own_queries() {
        let runner = ScriptedRunner::new()
            .on("information_schema.columns", |_| {
                Ok(vec![
                    record(json!({"table_name": "projects", "column_count": 27})),
                    record(json!({"table_name": "team_members", "column_count": 18})),
                ])
            })
            .on("pg_database_size", |_| Ok(vec![record(json!({"size": "8 MB"}))]))
            .on("pg_stat_activity", |_| Ok(vec![record(json!({"count": 3}))]));
        let db = runner.database();

        let status = debug_status(&db).await;

        let schema = status.schema.unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].table_name, "projects");
        assert_eq!(schema[0].column_count, 27);
        assert_eq!(status.database_size.as_deref(), Some("8 MB"));
        assert_eq!(status.active_connections, Some(3));
        assert!(status.connection.success);
        assert_eq!(status.query_metrics.total_queries, 4);
        assert_eq!(status.performance.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn failed_introspection_leaves_field_empty() {
        let runner = ScriptedRunner::new()
            .on("pg_stat_activity", |_| Err(sqlx::Error::PoolTimedOut))
            .on("pg_database_size", |_| Ok(vec![record(json!({"size": "8 MB"}))]));
        let db = runner.database();

        let status = debug_status(&db).await;

        assert_eq!(status.active_connections, None);
        assert_eq!(status.database_size.as_deref(), Some("8 MB"));
        assert_eq!(status.query_metrics.failed_queries, 1);
        assert_eq!(status.performance.status, HealthStatus::Degraded);
    }

    #[test]
    fn empty_tracker_is_idle() {
        let metrics = crate::tracker::PerformanceTracker::default().snapshot();
        assert_eq!(PerformanceSummary::from_metrics(&metrics).status, HealthStatus::Idle);
    }
}
