//! Exponential-backoff retry.

use crate::clock::Clock;
use std::future::Future;
use std::time::Duration;

/// Retry bound and backoff base.
///
/// Attempt 0 runs immediately. After a failed attempt `k < max_retries` the
/// engine waits `base_delay * 2^k` before trying again, so a permanently
/// failing operation runs `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay applied after failed attempt number `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds or the retry budget is spent.
    ///
    /// `on_retry` is called before each wait with the 1-based retry number,
    /// the error that triggered it and the delay about to be applied. The
    /// last error is returned unmodified. The operation must be safe to repeat.
    pub async fn run_with_backoff<T, E, F, Fut, R>(
        &self,
        clock: &dyn Clock,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(u32, &E, Duration),
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    on_retry(attempt + 1, &e, delay);
                    clock.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
