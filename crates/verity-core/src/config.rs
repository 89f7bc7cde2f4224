//! `config.toml` handling.
//!
//! One file with `[client]`, `[batch]` and `[probe]` sections. Every field has
//! a default, so a partial file (or none at all) is valid. `VERITY_*`
//! environment variables override the file.

use crate::error::{ConfigError, ConfigResult};
use crate::types::ProxyConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a `verity` process can be configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resilient client settings (cache, retry, rate limit, activity log)
    pub client: ClientConfig,
    /// Batch scheduling defaults
    pub batch: BatchConfig,
    /// HTTP probe settings
    pub probe: ProbeConfig,
}

impl AppConfig {
    /// Read the per-user config file, or defaults when there is none.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!(path = %path.display(), "Reading config");
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    /// Load configuration with environment variable overrides, then validate.
    ///
    /// When `path` is `None` the default location is used.
    ///
    /// Supports the following environment variables:
    /// - `VERITY_RATE_LIMIT_PER_MINUTE`: Override the admission ceiling
    /// - `VERITY_CACHE_TTL_MS`: Override the cache freshness TTL
    /// - `VERITY_MAX_RETRIES`: Override the retry bound
    /// - `VERITY_LOGGING_ENABLED`: Override in-memory activity logging (true/false)
    /// - `VERITY_PROBE_ENDPOINT`: Override the probe endpoint URL
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(limit) = lookup("VERITY_RATE_LIMIT_PER_MINUTE").and_then(|v| v.parse().ok()) {
            self.client.rate_limit_per_minute = limit;
            tracing::debug!("Override client.rate_limit_per_minute from env: {}", limit);
        }

        if let Some(ttl) = lookup("VERITY_CACHE_TTL_MS").and_then(|v| v.parse().ok()) {
            self.client.cache_ttl_ms = ttl;
            tracing::debug!("Override client.cache_ttl_ms from env: {}", ttl);
        }

        if let Some(retries) = lookup("VERITY_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.client.max_retries = retries;
            tracing::debug!("Override client.max_retries from env: {}", retries);
        }

        if let Some(enabled) = lookup("VERITY_LOGGING_ENABLED").and_then(|v| v.parse().ok()) {
            self.client.logging_enabled = enabled;
            tracing::debug!("Override client.logging_enabled from env: {}", enabled);
        }

        if let Some(endpoint) = lookup("VERITY_PROBE_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Override probe.endpoint from env: {}", endpoint);
            self.probe.endpoint = Some(endpoint);
        }
    }

    /// Reject values the client cannot operate with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.rate_limit_per_minute == 0 {
            return Err(invalid(
                "client.rate_limit_per_minute",
                "must be greater than zero",
            ));
        }
        if self.client.cache_ttl_ms == 0 {
            return Err(invalid("client.cache_ttl_ms", "must be greater than zero"));
        }
        if self.client.cache_max_entries == Some(0) {
            return Err(invalid(
                "client.cache_max_entries",
                "must be greater than zero when set",
            ));
        }
        if self.client.log_max_entries == Some(0) {
            return Err(invalid(
                "client.log_max_entries",
                "must be greater than zero when set",
            ));
        }
        if self.batch.max_batch_size == 0 {
            return Err(invalid("batch.max_batch_size", "must be greater than zero"));
        }
        if self.probe.timeout_secs == 0 {
            return Err(invalid("probe.timeout_secs", "must be greater than zero"));
        }
        if self.probe.identifier_field.trim().is_empty() {
            return Err(invalid("probe.identifier_field", "must not be empty"));
        }
        Ok(())
    }

    /// Write to the per-user location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Write to `path`, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| invalid("config_path", "has no parent directory"))?;
        fs::create_dir_all(dir)?;

        tracing::debug!(path = %path.display(), "Writing config");
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Per-user config file location (`~/.config/verity/config.toml` on Linux).
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "verity", "verity").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Settings of one resilient client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum age of a cached result in milliseconds
    pub cache_ttl_ms: u64,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// First backoff delay in milliseconds, doubled on every retry
    pub retry_base_delay_ms: u64,
    /// Admissions allowed in any trailing 60-second window
    pub rate_limit_per_minute: u32,
    /// Keep activity log entries in memory
    pub logging_enabled: bool,
    /// Optional cap on cached keys (oldest entry evicted first)
    pub cache_max_entries: Option<usize>,
    /// Optional cap on retained activity log entries
    pub log_max_entries: Option<usize>,
}

impl ClientConfig {
    /// Cache TTL as a `Duration`.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Base retry delay as a `Duration`.
    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 3_600_000, // 1 hour
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            rate_limit_per_minute: 30,
            logging_enabled: true,
            cache_max_entries: None,
            log_max_entries: None,
        }
    }
}

/// Batch scheduling defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between consecutive items in milliseconds
    pub delay_ms: u64,
    /// Halt the batch after the first failed item
    pub stop_on_error: bool,
    /// Largest accepted batch
    pub max_batch_size: usize,
    /// Proxies rotated round-robin across items
    pub proxies: Vec<ProxyConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            stop_on_error: false,
            max_batch_size: 1_000,
            proxies: Vec::new(),
        }
    }
}

/// HTTP probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Endpoint the identifier is posted to
    pub endpoint: Option<String>,
    /// Form field carrying the identifier
    pub identifier_field: String,
    /// Additional constant form fields
    pub extra_fields: BTreeMap<String, String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Optional `Referer` header
    pub referer: Option<String>,
    /// Case-insensitive patterns meaning "not registered"
    pub not_found_patterns: Vec<String>,
    /// Case-insensitive patterns meaning "registered"
    pub found_patterns: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            identifier_field: "email".to_string(),
            extra_fields: BTreeMap::new(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            referer: None,
            not_found_patterns: Vec::new(),
            found_patterns: Vec::new(),
        }
    }
}
