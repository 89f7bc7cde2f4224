//! Time source and delay primitive used by the client.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Monotonic clock with an async sleep.
///
/// The client reads time and suspends only through this trait, so a host can
/// substitute its own scheduler.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
///
/// Honors `tokio::time::pause`, which the test suites rely on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
