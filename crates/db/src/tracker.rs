//! In-process query performance tracking.
//!
//! One [`PerformanceTracker`] is created at process start and shared (via
//! `Arc`) with the [`Database`](crate::executor::Database) handle. Every
//! query outcome goes through [`PerformanceTracker::record`], which updates
//! all counters and windows under a single lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use folio_core::types::Timestamp;

/// Number of recent latencies the running mean is computed over.
pub const LATENCY_WINDOW: usize = 100;
/// Number of slow queries kept.
pub const SLOW_QUERY_WINDOW: usize = 10;
/// Number of most recent queries kept regardless of latency.
pub const RECENT_QUERY_WINDOW: usize = 20;
/// Default threshold above which a query counts as slow.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(1000);

/// A single recorded query outcome.
#[derive(Debug, Clone, Serialize)]
pub struct QuerySample {
    pub operation: String,
    pub duration_ms: u64,
    pub success: bool,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time copy of the tracker state.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMetrics {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    /// Mean over the last [`LATENCY_WINDOW`] durations, in milliseconds.
    pub average_response_time_ms: f64,
    pub fastest_query_ms: Option<u64>,
    pub slowest_query_ms: Option<u64>,
    pub success_rate: f64,
    pub slow_queries: Vec<QuerySample>,
    pub recent_queries: Vec<QuerySample>,
    pub tracking_since: Timestamp,
}

#[derive(Debug, Default)]
struct TrackerState {
    total: u64,
    successful: u64,
    failed: u64,
    latencies: VecDeque<u64>,
    fastest_ms: Option<u64>,
    slowest_ms: Option<u64>,
    slow: VecDeque<QuerySample>,
    recent: VecDeque<QuerySample>,
}

pub struct PerformanceTracker {
    state: Mutex<TrackerState>,
    slow_threshold: Duration,
    tracking_since: Mutex<Timestamp>,
}

impl PerformanceTracker {
    pub fn new(slow_threshold: Duration) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            slow_threshold,
            tracking_since: Mutex::new(chrono::Utc::now()),
        }
    }

    /// Record the outcome of an operation that started at `started`.
    pub fn record(&self, operation: &str, started: Instant, success: bool, error: Option<&str>) {
        self.record_duration(operation, started.elapsed(), success, error);
    }

    /// Record an outcome whose duration is already known.
    pub fn record_duration(
        &self,
        operation: &str,
        duration: Duration,
        success: bool,
        error: Option<&str>,
    ) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let sample = QuerySample {
            operation: operation.to_string(),
            duration_ms,
            success,
            timestamp: chrono::Utc::now(),
            error: error.map(str::to_string),
        };
        let is_slow = duration > self.slow_threshold;

        let mut state = self.lock();
        state.total += 1;
        if success {
            state.successful += 1;
        } else {
            state.failed += 1;
        }

        push_bounded(&mut state.latencies, duration_ms, LATENCY_WINDOW);
        state.fastest_ms = Some(state.fastest_ms.map_or(duration_ms, |f| f.min(duration_ms)));
        state.slowest_ms = Some(state.slowest_ms.map_or(duration_ms, |s| s.max(duration_ms)));

        if is_slow {
            push_bounded(&mut state.slow, sample.clone(), SLOW_QUERY_WINDOW);
        }
        push_bounded(&mut state.recent, sample, RECENT_QUERY_WINDOW);
        drop(state);

        if is_slow {
            tracing::warn!(operation, duration_ms, success, "Slow query");
        } else {
            tracing::debug!(operation, duration_ms, success, "Query recorded");
        }
    }

    pub fn snapshot(&self) -> QueryMetrics {
        let tracking_since = *self
            .tracking_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = self.lock();

        let average_response_time_ms = if state.latencies.is_empty() {
            0.0
        } else {
            state.latencies.iter().sum::<u64>() as f64 / state.latencies.len() as f64
        };
        let success_rate = if state.total == 0 {
            0.0
        } else {
            state.successful as f64 / state.total as f64 * 100.0
        };

        QueryMetrics {
            total_queries: state.total,
            successful_queries: state.successful,
            failed_queries: state.failed,
            average_response_time_ms,
            fastest_query_ms: state.fastest_ms,
            slowest_query_ms: state.slowest_ms,
            success_rate,
            slow_queries: state.slow.iter().cloned().collect(),
            recent_queries: state.recent.iter().cloned().collect(),
            tracking_since,
        }
    }

    /// Clear all counters and windows.
    pub fn reset(&self) {
        *self.lock() = TrackerState::default();
        *self
            .tracking_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = chrono::Utc::now();
    }

    // A panic while holding the lock cannot leave the counters in a state
    // worse than stale, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_THRESHOLD)
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, item: T, capacity: usize) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(item);
}
