//! The resilient probe client.
//!
//! `ProbeClient` composes the rate limiter, the result cache and the retry
//! engine around one [`Probe`]. Each call runs admission check, cache lookup,
//! probe with retry, cache write, in that order, short-circuiting on the first
//! failure. Admission is checked before the cache, so cache hits count against
//! the per-minute budget too.

use crate::activity::{ActivityLog, LogEntry, LogLevel};
use crate::cache::{CacheLookup, ResultCache};
use crate::clock::{Clock, TokioClock};
use crate::error::{ClientError, ProbeError, Result};
use crate::probe::Probe;
use crate::rate_limit::{RateLimiter, WINDOW};
use crate::retry::RetryPolicy;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use verity_core::{ClientConfig, ProbeKey, ProbeResult, ProxyConfig};

/// Point-in-time counters for a client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    /// Entries currently held by the cache (stale ones until read)
    pub cache_size: usize,
    /// Entries retained by the activity log
    pub log_size: usize,
    /// Activity log entries recorded during the last minute
    pub requests_this_minute: usize,
    /// Admissions granted by the rate limiter during the last minute
    pub admissions_this_minute: usize,
}

/// Cache + rate limit + retry around a single probe collaborator.
///
/// All operations take `&mut self`: one instance never runs two operations
/// at once, and instances share no state.
pub struct ProbeClient {
    probe: Arc<dyn Probe>,
    clock: Arc<dyn Clock>,
    cache: ResultCache,
    limiter: RateLimiter,
    retry: RetryPolicy,
    activity: ActivityLog,
    config: ClientConfig,
}

impl ProbeClient {
    /// Create a client on the tokio clock.
    #[must_use]
    pub fn new(probe: Arc<dyn Probe>, config: ClientConfig) -> Self {
        Self {
            probe,
            clock: Arc::new(TokioClock),
            cache: ResultCache::new(config.cache_ttl()).with_max_entries(config.cache_max_entries),
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            retry: RetryPolicy::new(config.max_retries, config.retry_base_delay()),
            activity: ActivityLog::new(config.logging_enabled)
                .with_max_entries(config.log_max_entries),
            config,
        }
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Check one identifier.
    ///
    /// # Errors
    /// Returns [`ClientError::RateLimitExceeded`] when admission is refused
    /// and [`ClientError::Probe`] with the last error once retries are spent.
    /// Neither outcome touches the cache.
    pub async fn validate(
        &mut self,
        key: &ProbeKey,
        proxy: Option<&ProxyConfig>,
    ) -> Result<ProbeResult> {
        let now = self.clock.now();

        if let Err(e) = self.check_rate_limit() {
            self.log(
                LogLevel::Error,
                "Validation failed",
                json!({ "key": key.as_str(), "error": e.to_string() }),
            );
            return Err(e);
        }

        match self.cache.lookup(key, now) {
            CacheLookup::Hit { result, age } => {
                self.log(
                    LogLevel::Info,
                    "Cache hit",
                    json!({ "key": key.as_str(), "ageMs": millis(age) }),
                );
                return Ok(result);
            }
            CacheLookup::Expired { age } => {
                self.log(
                    LogLevel::Info,
                    "Cache expired",
                    json!({ "key": key.as_str(), "ageMs": millis(age) }),
                );
            }
            CacheLookup::Miss => {}
        }

        self.log(
            LogLevel::Info,
            "Validating",
            json!({ "key": key.as_str(), "probe": self.probe.probe_id() }),
        );

        let outcome = self.probe_with_retry(key, proxy).await;

        match outcome {
            Ok(result) => {
                let now = self.clock.now();
                self.cache.put(key.clone(), result.clone(), now);
                self.log(LogLevel::Debug, "Cached result", json!({ "key": key.as_str() }));
                self.log(
                    LogLevel::Info,
                    "Validation complete",
                    json!({
                        "key": key.as_str(),
                        "isRegistered": result.is_registered,
                        "statusCode": result.status_code,
                        "proxyEnabled": proxy.is_some(),
                    }),
                );
                Ok(result)
            }
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    "Validation failed",
                    json!({ "key": key.as_str(), "error": e.to_string() }),
                );
                Err(ClientError::Probe(e))
            }
        }
    }

    /// Remove one cached key, or the whole cache when `key` is `None`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_cache(&mut self, key: Option<&ProbeKey>) -> usize {
        let removed = self.cache.clear(key);
        match key {
            Some(key) => self.log(
                LogLevel::Info,
                "Cleared cache for key",
                json!({ "key": key.as_str(), "removed": removed }),
            ),
            None => self.log(
                LogLevel::Info,
                "Cleared all cache",
                json!({ "clearedEntries": removed }),
            ),
        }
        removed
    }

    /// Counters for cache, log and rate limiter.
    #[must_use]
    pub fn stats(&self) -> ClientStats {
        let now = self.clock.now();
        ClientStats {
            cache_size: self.cache.len(),
            log_size: self.activity.len(),
            requests_this_minute: self.activity.count_within(WINDOW, now),
            admissions_this_minute: self.limiter.in_window(now),
        }
    }

    /// Retained activity log entries, optionally filtered by level.
    #[must_use]
    pub fn logs(&self, level: Option<LogLevel>) -> Vec<&LogEntry> {
        self.activity.entries(level)
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub(crate) fn log(&mut self, level: LogLevel, message: &str, data: Value) {
        let now = self.clock.now();
        self.activity.record(level, message, data, now);
    }

    /// Admission check. Log entries older than the window are dropped here as
    /// well; this is the log's retention rule and does not feed the limiter.
    fn check_rate_limit(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.activity.prune_older_than(WINDOW, now);

        if let Err(e) = self.limiter.check_admission(now) {
            if let ClientError::RateLimitExceeded { current, limit } = &e {
                self.log(
                    LogLevel::Warn,
                    "Rate limit exceeded",
                    json!({ "currentRequests": current, "limit": limit }),
                );
            }
            return Err(e);
        }
        Ok(())
    }

    async fn probe_with_retry(
        &mut self,
        key: &ProbeKey,
        proxy: Option<&ProxyConfig>,
    ) -> std::result::Result<ProbeResult, ProbeError> {
        let probe = Arc::clone(&self.probe);
        let clock = Arc::clone(&self.clock);
        let max_retries = self.retry.max_retries;
        let activity = &mut self.activity;

        self.retry
            .run_with_backoff(
                clock.as_ref(),
                || probe.probe(key, proxy),
                |retry, err: &ProbeError, delay| {
                    activity.record(
                        LogLevel::Warn,
                        &format!("Retry {retry}/{max_retries}"),
                        json!({ "key": key.as_str(), "error": err.to_string(), "delayMs": millis(delay) }),
                        clock.now(),
                    );
                },
            )
            .await
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProbe(ProbeResult);

    #[async_trait]
    impl Probe for FixedProbe {
        async fn probe(
            &self,
            _key: &ProbeKey,
            _proxy: Option<&ProxyConfig>,
        ) -> std::result::Result<ProbeResult, ProbeError> {
            Ok(self.0.clone())
        }

        fn probe_id(&self) -> &str {
            "fixed"
        }
    }

    fn client(config: ClientConfig) -> ProbeClient {
        ProbeClient::new(
            Arc::new(FixedProbe(ProbeResult::registered("found", Some(200)))),
            config,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_populates_cache_and_log() {
        let mut client = client(ClientConfig::default());
        let key = ProbeKey::new("user@example.com");

        let result = client.validate(&key, None).await.expect("validate");
        assert!(result.is_registered);

        let stats = client.stats();
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.admissions_this_minute, 1);

        let messages: Vec<&str> = client
            .logs(None)
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Validating", "Cached result", "Validation complete"]
        );
        assert_eq!(client.logs(Some(LogLevel::Debug)).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_is_logged() {
        let mut client = client(ClientConfig::default());
        client
            .validate(&ProbeKey::new("a@example.com"), None)
            .await
            .expect("validate");

        assert_eq!(client.clear_cache(Some(&ProbeKey::new("other@example.com"))), 0);
        assert_eq!(client.clear_cache(None), 1);
        assert_eq!(client.stats().cache_size, 0);

        let last = client.logs(None).last().map(|e| e.message.clone());
        assert_eq!(last.as_deref(), Some("Cleared all cache"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_pruned_to_window_on_admission() {
        let mut client = client(ClientConfig::default());
        client
            .validate(&ProbeKey::new("a@example.com"), None)
            .await
            .expect("validate");
        assert_eq!(client.stats().log_size, 3);

        tokio::time::advance(std::time::Duration::from_secs(61)).await;
        assert_eq!(client.stats().requests_this_minute, 0);

        // Cache hit: the three old entries are dropped, one new entry is added
        client
            .validate(&ProbeKey::new("a@example.com"), None)
            .await
            .expect("validate");
        let messages: Vec<&str> = client
            .logs(None)
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(messages, vec!["Cache hit"]);
    }

    #[test]
    fn test_config_is_kept() {
        let config = ClientConfig {
            rate_limit_per_minute: 90,
            ..ClientConfig::default()
        };
        let client = client(config.clone());
        assert_eq!(client.config(), &config);
    }
}
