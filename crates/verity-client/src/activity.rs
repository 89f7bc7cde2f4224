//! In-memory activity log.
//!
//! Every record is forwarded to `tracing` under the `verity::activity` target.
//! Retention in memory is controlled by the `logging_enabled` flag, an optional
//! entry cap, and the window pruning the client performs on each admission
//! check.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use verity_core::Timestamp;

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose internals
    Debug,
    /// Normal progress
    Info,
    /// Recoverable problems
    Warn,
    /// Failed operations
    Error,
}

impl LogLevel {
    /// Lowercase name, as serialized.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// One recorded event. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Wall-clock time of the event
    pub timestamp: Timestamp,
    /// Severity
    pub level: LogLevel,
    /// Short description
    pub message: String,
    /// Structured context
    pub data: Map<String, Value>,
    #[serde(skip)]
    recorded_at: Instant,
}

/// Append-only, in-memory event log.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    enabled: bool,
    max_entries: Option<usize>,
}

impl ActivityLog {
    /// Create a log. When `enabled` is false events only reach `tracing`.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: VecDeque::new(),
            enabled,
            max_entries: None,
        }
    }

    /// Cap retained entries; the oldest are dropped first.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Record an event. `data` is flattened when it is a JSON object and
    /// stored under `"value"` otherwise.
    pub fn record(&mut self, level: LogLevel, message: &str, data: Value, now: Instant) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "verity::activity", %data, "{message}"),
            LogLevel::Info => tracing::info!(target: "verity::activity", %data, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "verity::activity", %data, "{message}"),
            LogLevel::Error => tracing::error!(target: "verity::activity", %data, "{message}"),
        }

        if !self.enabled {
            return;
        }

        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        self.entries.push_back(LogEntry {
            timestamp: Timestamp::now(),
            level,
            message: message.to_string(),
            data,
            recorded_at: now,
        });

        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
    }

    /// Drop entries recorded at or before `now - window`. Returns how many
    /// were dropped.
    pub fn prune_older_than(&mut self, window: Duration, now: Instant) -> usize {
        let Some(cutoff) = now.checked_sub(window) else {
            return 0;
        };
        let before = self.entries.len();
        while let Some(front) = self.entries.front() {
            if front.recorded_at <= cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        before - self.entries.len()
    }

    /// Entries in recording order, optionally filtered by level.
    #[must_use]
    pub fn entries(&self, level: Option<LogLevel>) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|entry| level.map_or(true, |l| entry.level == l))
            .collect()
    }

    /// Entries recorded less than `window` before `now`.
    #[must_use]
    pub fn count_within(&self, window: Duration, now: Instant) -> usize {
        self.entries
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.recorded_at) < window)
            .count()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
