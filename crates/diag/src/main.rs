//! Operator entry point for the persistence layer.
//!
//! ```text
//! folio-diag migrate   apply pending migrations
//! folio-diag ping      run the connection test
//! folio-diag status    print the full debug status (default)
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_db::diagnostics::{debug_status, test_connection};
use folio_db::{Database, DbConfig, PerformanceTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = DbConfig::from_env()?;
    let pool = folio_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;

    let tracker = Arc::new(PerformanceTracker::new(config.slow_query_threshold()));
    let db = Database::new(pool.clone(), tracker, config.timeouts());

    let command = std::env::args().nth(1).unwrap_or_else(|| "status".into());
    tracing::info!(command = %command, "Running diagnostic command");

    match command.as_str() {
        "migrate" => {
            folio_db::run_migrations(&pool).await?;
            println!("Migrations applied");
        }
        "ping" => {
            let result = test_connection(&db).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                anyhow::bail!("{}", result.message);
            }
        }
        "status" => {
            let status = debug_status(&db).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        other => anyhow::bail!("Unknown command '{other}' (expected migrate, ping or status)"),
    }

    Ok(())
}

/// Logs go to stderr so command output stays machine-readable.
/// `LOG_FORMAT=json` switches to structured JSON lines.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_diag=info,folio_db=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
