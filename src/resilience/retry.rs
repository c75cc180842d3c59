//! Bounded retries with exponential backoff
//!
//! The wrapped operation must be idempotent. Backoff sleeps on the tokio
//! timer, so a backing-off request never stalls other in-flight requests, and
//! no sleep happens after the final attempt.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy for a fallible asynchronous operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            // A budget of zero attempts would never run the operation
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_multiplier,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff delay slept after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.base_delay
            .mul_f64(self.backoff_multiplier.powi(exponent as i32))
    }

    /// Run `op`, retrying on failure until the attempt budget is exhausted
    ///
    /// The last error is propagated to the caller as the terminal failure.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(op, |_| true).await
    }

    /// Like [`run`](Self::run), but only errors `is_retryable` accepts are
    /// retried; anything else fails immediately without backoff
    pub async fn run_if<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !is_retryable(&e) {
                        warn!(attempt, error = %e, "Error is not retryable; failing immediately");
                        return Err(e);
                    }
                    if attempt == self.max_attempts {
                        error!(
                            attempts = self.max_attempts,
                            error = %e,
                            "Retry budget exhausted"
                        );
                        last_error = Some(e);
                        break;
                    }
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed; backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error.expect("loop runs at least one attempt"))
    }
}
