//! Bounded retry with linear backoff for hydration-heavy reads.
//!
//! Attempt `n` that fails waits `n × base_delay` before attempt `n + 1`.
//! A legitimate "no rows" result ends the loop immediately. After the last
//! failed attempt the caller gets `None` rather than an error, and the
//! failure is recorded with the attempt count.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::DbResult;
use crate::tracker::PerformanceTracker;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Run `attempt` until it yields a value, yields nothing, or exhausts the
/// policy.
///
/// The closure receives the 1-based attempt number. Errors that are not
/// retryable (validation) stop the loop on the spot.
pub async fn with_retry<T, F, Fut>(
    tracker: &PerformanceTracker,
    operation: &str,
    policy: &RetryPolicy,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DbResult<Option<T>>>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);

    for n in 1..=max_attempts {
        match attempt(n).await {
            Ok(found) => {
                if n > 1 {
                    tracing::info!(operation, attempt = n, "Succeeded after retry");
                }
                return found;
            }
            Err(err) if n < max_attempts && err.is_retryable() => {
                let delay = policy.delay_after(n);
                tracing::warn!(
                    operation,
                    attempt = n,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                tracing::error!(operation, attempts = n, error = %err, "Giving up");
                tracker.record(
                    &format!("{operation} (failed after {n} attempts)"),
                    started,
                    false,
                    Some(&err.to_string()),
                );
                return None;
            }
        }
    }

    None
}
