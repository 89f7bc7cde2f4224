//! Verity Client - Resilient wrapper around a single unreliable probe.
//!
//! This crate hardens one abstract [`Probe`] with a time-bounded result cache,
//! a sliding-window rate limiter, exponential-backoff retry and a sequential
//! batch scheduler with optional proxy rotation. Every layer writes to an
//! in-memory activity log that doubles as a statistics source.
//!
//! # Features
//!
//! - Read-time TTL eviction, optional size bound
//! - Fail-fast admission control over a trailing 60-second window
//! - Iterative exponential backoff for transient probe errors
//! - Ordered batches with pacing, round-robin proxies and stop-on-error
//!
//! # Example
//!
//! ```rust,ignore
//! use verity_client::{BatchOptions, ProbeClient};
//! use verity_core::{ClientConfig, ProbeKey};
//! use std::sync::Arc;
//!
//! let mut client = ProbeClient::new(Arc::new(http_probe), ClientConfig::default());
//!
//! let result = client.validate(&ProbeKey::new("user@example.com"), None).await?;
//!
//! let keys = vec![ProbeKey::new("a@example.com"), ProbeKey::new("b@example.com")];
//! let results = client.validate_batch(&keys, &BatchOptions::default()).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod activity;
pub mod batch;
pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod probe;
pub mod rate_limit;
pub mod retry;

// Re-export commonly used types
pub use activity::{ActivityLog, LogEntry, LogLevel};
pub use batch::{BatchItem, BatchOptions, BatchResult, BatchSummary};
pub use cache::{CacheLookup, ResultCache};
pub use client::{ClientStats, ProbeClient};
pub use clock::{Clock, TokioClock};
pub use error::{ClientError, ProbeError, Result};
pub use probe::Probe;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
