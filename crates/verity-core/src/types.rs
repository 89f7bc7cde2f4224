//! Shared types used across Verity.
//!
//! This module defines the newtypes and records that flow between the probe
//! collaborator, the resilient client and the shells around it.

use crate::error::VerityError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Proxy schemes the HTTP layer can route through.
const PROXY_SCHEMES: [&str; 2] = ["http", "https"];

/// Opaque identifier being probed.
///
/// The client compares keys byte-for-byte. Trimming and case folding are the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeKey(String);

impl ProbeKey {
    /// Create a key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProbeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProbeKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ProbeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Check an email address against the loose `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_REGEX.is_match(candidate)
}

/// Verdict of a single probe.
///
/// A `ProbeResult` is terminal whatever its status: "not registered" and
/// "invalid format" are answers, not failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Whether the identifier appears to be registered
    pub is_registered: bool,
    /// Human-readable verdict
    pub message: String,
    /// Verdict status (200, 4xx, 408, 429, 500)
    pub status_code: u16,
    /// Raw HTTP status returned by the remote endpoint, when one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
}

impl ProbeResult {
    /// Status for a registered identifier.
    pub const STATUS_REGISTERED: u16 = 200;
    /// Status for a malformed identifier.
    pub const STATUS_INVALID: u16 = 400;
    /// Status for a definitive "not registered" answer.
    pub const STATUS_NOT_FOUND: u16 = 404;
    /// Status for a request that timed out.
    pub const STATUS_TIMEOUT: u16 = 408;
    /// Status synthesized when the client refuses admission.
    pub const STATUS_RATE_LIMITED: u16 = 429;
    /// Status for an indeterminate answer or an error.
    pub const STATUS_INDETERMINATE: u16 = 500;

    /// The identifier is registered.
    #[must_use]
    pub fn registered(message: impl Into<String>, response_code: Option<u16>) -> Self {
        Self {
            is_registered: true,
            message: message.into(),
            status_code: Self::STATUS_REGISTERED,
            response_code,
        }
    }

    /// The identifier is definitively not registered.
    #[must_use]
    pub fn not_registered(message: impl Into<String>, response_code: Option<u16>) -> Self {
        Self {
            is_registered: false,
            message: message.into(),
            status_code: Self::STATUS_NOT_FOUND,
            response_code,
        }
    }

    /// The identifier was rejected before any request was made.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_registered: false,
            message: message.into(),
            status_code: Self::STATUS_INVALID,
            response_code: None,
        }
    }

    /// The endpoint answered but the answer could not be interpreted.
    #[must_use]
    pub fn indeterminate(message: impl Into<String>, response_code: Option<u16>) -> Self {
        Self {
            is_registered: false,
            message: message.into(),
            status_code: Self::STATUS_INDETERMINATE,
            response_code,
        }
    }
}

/// Outbound proxy passed through to the probe collaborator.
///
/// Built from `host:port` (assumed HTTP) or a full `http://` or `https://`
/// proxy URL such as `https://user:pw@10.0.0.1:8443`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProxyConfig {
    url: String,
}

impl ProxyConfig {
    /// Parse a proxy from `host:port` or a URL with a scheme.
    ///
    /// # Errors
    /// Returns a validation error for empty input, a missing host, a scheme
    /// other than `http` or `https`, or a `host:port` pair without a numeric
    /// port.
    pub fn parse(input: &str) -> Result<Self, VerityError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VerityError::Validation("proxy must not be empty".to_string()));
        }

        if let Some((scheme, rest)) = input.split_once("://") {
            if scheme.is_empty() || rest.is_empty() {
                return Err(VerityError::Validation(format!(
                    "invalid proxy URL: '{input}'"
                )));
            }
            if !PROXY_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
                return Err(VerityError::Validation(format!(
                    "unsupported proxy scheme '{scheme}' in '{input}' (expected http or https)"
                )));
            }
            return Ok(Self {
                url: input.to_string(),
            });
        }

        let (host, port) = input.rsplit_once(':').ok_or_else(|| {
            VerityError::Validation(format!("proxy must be host:port, got '{input}'"))
        })?;
        if host.is_empty() {
            return Err(VerityError::Validation(format!(
                "proxy host missing in '{input}'"
            )));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| VerityError::Validation(format!("invalid proxy port in '{input}'")))?;

        Ok(Self {
            url: format!("http://{host}:{port}"),
        })
    }

    /// The proxy URL handed to the HTTP layer.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl TryFrom<String> for ProxyConfig {
    type Error = VerityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProxyConfig> for String {
    fn from(proxy: ProxyConfig) -> Self {
        proxy.url
    }
}

/// Wall-clock time of an activity event, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}
