//! Sequential batch scheduling.
//!
//! A batch drives [`ProbeClient::validate`] over an ordered list of keys, one
//! item at a time, pausing between items. Per-item failures become error
//! results in the output instead of failing the batch.

use crate::activity::LogLevel;
use crate::client::ProbeClient;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use verity_core::{BatchConfig, ProbeKey, ProbeResult, ProxyConfig};

/// Scheduling options for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Pause between consecutive items
    pub delay: Duration,
    /// Halt right after the first failed item
    pub stop_on_error: bool,
    /// Proxy applied to every item when `proxies` is empty
    pub proxy: Option<ProxyConfig>,
    /// Proxies rotated round-robin by item index
    pub proxies: Vec<ProxyConfig>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1_000),
            stop_on_error: false,
            proxy: None,
            proxies: Vec::new(),
        }
    }
}

impl BatchOptions {
    /// Options seeded from the `[batch]` configuration section.
    #[must_use]
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            stop_on_error: config.stop_on_error,
            proxy: None,
            proxies: config.proxies.clone(),
        }
    }

    /// Set the inter-item delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Halt after the first failure.
    #[must_use]
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    /// Route every item through one proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Rotate items across these proxies.
    #[must_use]
    pub fn with_proxies(mut self, proxies: Vec<ProxyConfig>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Proxy assigned to the item at `index`.
    #[must_use]
    pub fn proxy_for(&self, index: usize) -> Option<&ProxyConfig> {
        if self.proxies.is_empty() {
            self.proxy.as_ref()
        } else {
            self.proxies.get(index % self.proxies.len())
        }
    }

    /// The items a batch over `keys` will execute, in order.
    #[must_use]
    pub fn plan(&self, keys: &[ProbeKey]) -> Vec<BatchItem> {
        keys.iter()
            .enumerate()
            .map(|(index, key)| BatchItem {
                index,
                key: key.clone(),
                proxy: self.proxy_for(index).cloned(),
            })
            .collect()
    }
}

/// One scheduled unit of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Position in the input
    pub index: usize,
    /// Identifier to check
    pub key: ProbeKey,
    /// Proxy chosen for this item
    pub proxy: Option<ProxyConfig>,
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Position in the input
    pub index: usize,
    /// Identifier that was checked
    pub identifier: ProbeKey,
    /// Verdict, or a synthesized 500 result when `error` is set
    #[serde(flatten)]
    pub result: ProbeResult,
    /// Whether the client call failed
    pub error: bool,
}

impl BatchResult {
    fn success(item: &BatchItem, result: ProbeResult) -> Self {
        Self {
            index: item.index,
            identifier: item.key.clone(),
            result,
            error: false,
        }
    }

    fn failure(item: &BatchItem, message: String) -> Self {
        Self {
            index: item.index,
            identifier: item.key.clone(),
            result: ProbeResult {
                is_registered: false,
                message,
                status_code: ProbeResult::STATUS_INDETERMINATE,
                response_code: None,
            },
            error: true,
        }
    }
}

/// Aggregate counts over batch results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Results returned
    pub total: usize,
    /// Registered identifiers
    pub registered: usize,
    /// Identifiers answered as not registered (errors excluded)
    pub not_registered: usize,
    /// Failed items
    pub errors: usize,
}

impl BatchSummary {
    /// Count registered, not-registered and errored results.
    #[must_use]
    pub fn from_results(results: &[BatchResult]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, r| {
                if r.error {
                    summary.errors += 1;
                } else if r.result.is_registered {
                    summary.registered += 1;
                } else {
                    summary.not_registered += 1;
                }
                summary
            },
        )
    }
}

impl ProbeClient {
    /// Check `keys` one by one, in order.
    ///
    /// Results keep the input indices. A failed item is reported with
    /// `error: true` and status 500; with `stop_on_error` the batch halts
    /// right after it and later items are absent. No delay follows the last
    /// item or a halting failure.
    pub async fn validate_batch(
        &mut self,
        keys: &[ProbeKey],
        options: &BatchOptions,
    ) -> Vec<BatchResult> {
        let batch_id = uuid::Uuid::new_v4().to_string();
        let items = options.plan(keys);
        let clock = self.clock();
        let mut results = Vec::with_capacity(items.len());

        self.log(
            LogLevel::Info,
            "Starting batch validation",
            json!({
                "batchId": batch_id,
                "count": items.len(),
                "delayMs": u64::try_from(options.delay.as_millis()).unwrap_or(u64::MAX),
                "stopOnError": options.stop_on_error,
                "proxyEnabled": options.proxy.is_some(),
                "proxyRotation": options.proxies.len(),
            }),
        );

        for item in &items {
            match self.validate(&item.key, item.proxy.as_ref()).await {
                Ok(result) => results.push(BatchResult::success(item, result)),
                Err(e) => {
                    results.push(BatchResult::failure(item, e.to_string()));

                    if options.stop_on_error {
                        self.log(
                            LogLevel::Warn,
                            "Batch validation stopped on error",
                            json!({
                                "batchId": batch_id,
                                "stoppedAt": item.index,
                                "totalProcessed": item.index + 1,
                            }),
                        );
                        break;
                    }
                }
            }

            if item.index + 1 < items.len() {
                clock.sleep(options.delay).await;
            }
        }

        let summary = BatchSummary::from_results(&results);
        self.log(
            LogLevel::Info,
            "Batch validation complete",
            json!({
                "batchId": batch_id,
                "totalProcessed": summary.total,
                "registered": summary.registered,
                "notRegistered": summary.not_registered,
                "errors": summary.errors,
            }),
        );

        results
    }
}
