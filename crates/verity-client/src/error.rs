//! Error types for the probe pipeline.

use thiserror::Error;
use verity_core::ProbeResult;

/// Transient failure of the probe collaborator.
///
/// Every variant is considered retryable. A terminal verdict is never an
/// error: it is an `Ok(ProbeResult)` whatever its status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Transport failure (DNS, connection refused, reset)
    #[error("network error: {0}")]
    Network(String),

    /// No response within the probe's own timeout
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// Response could not be read or processed
    #[error("probe error: {0}")]
    Internal(String),
}

impl ProbeError {
    /// Verdict status a host would report for this failure.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Timeout { .. } => ProbeResult::STATUS_TIMEOUT,
            Self::Network(_) | Self::Internal(_) => ProbeResult::STATUS_INDETERMINATE,
        }
    }
}

/// Failures that escape a single `validate` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Admission refused by the sliding-window limiter
    #[error("rate limit exceeded: {limit} requests per minute (current: {current})")]
    RateLimitExceeded {
        /// Admissions already inside the window
        current: usize,
        /// Configured ceiling
        limit: u32,
    },

    /// The probe kept failing after every retry
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl ClientError {
    /// Verdict status a host would report for this failure.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimitExceeded { .. } => ProbeResult::STATUS_RATE_LIMITED,
            Self::Probe(e) => e.status_code(),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
