//! Bounded-retry executor for transient cloud-API failures
//!
//! The bound is attempt-count based, not wall-clock based. Expected
//! failures (already exists, already gone) must be absorbed inside the
//! operation itself; this wrapper only smooths over transient errors.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;

/// Retry policy for driver operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Delay between attempts
    pub delay: Duration,

    /// Cap on the per-attempt delay
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.delay;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts => {
                    tracing::debug!(label, attempt, error = %err, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                    delay = Duration::from_secs_f64(
                        (delay.as_secs_f64() * self.backoff_multiplier)
                            .min(self.max_delay.as_secs_f64()),
                    );
                }
                Err(err) => {
                    return Err(CloudError::RetriesExhausted {
                        attempts: self.max_attempts,
                        source: Box::new(err),
                    });
                }
            }
        }
        unreachable!("max_attempts is at least 1")
    }
}
