//! Sliding-window admission control.
//!
//! The limiter keeps its own list of admission instants. It is independent of
//! the activity log, so disabling logging never disables rate limiting.

use crate::error::{ClientError, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Width of the trailing admission window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Fail-fast limiter over a trailing 60-second window.
#[derive(Debug)]
pub struct RateLimiter {
    admitted: VecDeque<Instant>,
    limit_per_minute: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting `limit_per_minute` checks per window.
    #[must_use]
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            admitted: VecDeque::new(),
            limit_per_minute,
            window: WINDOW,
        }
    }

    /// Admit or reject a request at `now`.
    ///
    /// Instants at or before `now - 60s` are pruned first. A rejected check
    /// is not recorded.
    pub fn check_admission(&mut self, now: Instant) -> Result<()> {
        self.prune(now);

        let current = self.admitted.len();
        if current >= self.limit_per_minute as usize {
            return Err(ClientError::RateLimitExceeded {
                current,
                limit: self.limit_per_minute,
            });
        }

        self.admitted.push_back(now);
        Ok(())
    }

    /// Admissions still inside the window at `now`.
    #[must_use]
    pub fn in_window(&self, now: Instant) -> usize {
        match now.checked_sub(self.window) {
            Some(cutoff) => self.admitted.iter().filter(|t| **t > cutoff).count(),
            None => self.admitted.len(),
        }
    }

    /// Configured ceiling.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit_per_minute
    }

    fn prune(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while let Some(&front) = self.admitted.front() {
            if front <= cutoff {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let mut limiter = RateLimiter::new(3);
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter
                .check_admission(t0 + Duration::from_secs(i))
                .is_ok());
        }

        let err = limiter
            .check_admission(t0 + Duration::from_secs(10))
            .expect_err("fourth admission should fail");
        assert_eq!(
            err,
            ClientError::RateLimitExceeded {
                current: 3,
                limit: 3
            }
        );
        // Rejection is not recorded
        assert_eq!(limiter.in_window(t0 + Duration::from_secs(10)), 3);
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = RateLimiter::new(2);
        let t0 = Instant::now();

        limiter.check_admission(t0).expect("first");
        limiter
            .check_admission(t0 + Duration::from_secs(30))
            .expect("second");
        assert!(limiter
            .check_admission(t0 + Duration::from_secs(59))
            .is_err());

        // Earliest admission has aged out of the window
        assert!(limiter
            .check_admission(t0 + Duration::from_secs(61))
            .is_ok());
        // The second one has not
        assert!(limiter
            .check_admission(t0 + Duration::from_secs(62))
            .is_err());
    }

    #[test]
    fn test_in_window_does_not_record() {
        let mut limiter = RateLimiter::new(5);
        let t0 = Instant::now();
        limiter.check_admission(t0).expect("admit");

        assert_eq!(limiter.in_window(t0), 1);
        assert_eq!(limiter.in_window(t0), 1);
        assert_eq!(limiter.in_window(t0 + Duration::from_secs(61)), 0);
        assert_eq!(limiter.limit(), 5);
    }
}
