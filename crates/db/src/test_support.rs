//! Scripted in-memory [`QueryRunner`] for unit tests.
//!
//! Rules match on a substring of the SQL text and are tried in the order
//! they were added. Unmatched reads return no rows; unmatched writes report
//! one affected row. Every statement is logged for later assertions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use folio_core::types::Record;

use crate::executor::{Database, QueryRunner, QueryTimeouts};
use crate::statement::Statement;
use crate::tracker::PerformanceTracker;

type FetchHandler = Arc<dyn Fn(&Statement) -> Result<Vec<Record>, sqlx::Error> + Send + Sync>;
type ExecuteHandler = Arc<dyn Fn(&Statement) -> Result<u64, sqlx::Error> + Send + Sync>;

#[derive(Clone)]
enum FetchAction {
    Respond(FetchHandler),
    Stall(Duration),
}

#[derive(Default)]
struct Inner {
    fetch_rules: Mutex<Vec<(String, FetchAction)>>,
    execute_rules: Mutex<Vec<(String, ExecuteHandler)>>,
    log: Mutex<Vec<Statement>>,
}

#[derive(Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Inner>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(self, needle: &str, handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<Vec<Record>, sqlx::Error> + Send + Sync + 'static,
    {
        self.inner
            .fetch_rules
            .lock()
            .unwrap()
            .push((needle.to_string(), FetchAction::Respond(Arc::new(handler))));
        self
    }

    /// Reads matching `needle` never complete on their own.
    pub fn stall(self, needle: &str, delay: Duration) -> Self {
        self.inner
            .fetch_rules
            .lock()
            .unwrap()
            .push((needle.to_string(), FetchAction::Stall(delay)));
        self
    }

    pub fn on_execute<F>(self, needle: &str, handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<u64, sqlx::Error> + Send + Sync + 'static,
    {
        self.inner
            .execute_rules
            .lock()
            .unwrap()
            .push((needle.to_string(), Arc::new(handler)));
        self
    }

    /// A database handle backed by this runner with a fresh tracker.
    pub fn database(&self) -> Database {
        Database::with_runner(
            Arc::new(self.clone()),
            Arc::new(PerformanceTracker::default()),
            QueryTimeouts::default(),
        )
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.inner.log.lock().unwrap().clone()
    }

    /// Number of logged statements whose SQL contains `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.statements()
            .iter()
            .filter(|s| s.sql.contains(needle))
            .count()
    }
}

#[async_trait]
impl QueryRunner for ScriptedRunner {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Record>, sqlx::Error> {
        self.inner.log.lock().unwrap().push(statement.clone());
        let action = self
            .inner
            .fetch_rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| statement.sql.contains(needle.as_str()))
            .map(|(_, action)| action.clone());

        match action {
            Some(FetchAction::Respond(handler)) => handler(statement),
            Some(FetchAction::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error> {
        self.inner.log.lock().unwrap().push(statement.clone());
        let handler = self
            .inner
            .execute_rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| statement.sql.contains(needle.as_str()))
            .map(|(_, handler)| Arc::clone(handler));

        match handler {
            Some(handler) => handler(statement),
            None => Ok(1),
        }
    }
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
