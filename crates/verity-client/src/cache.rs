//! Time-bounded result cache.
//!
//! Entries expire lazily: staleness is observed on read and the stale entry is
//! dropped at that point. There is no background sweep.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use verity_core::{ProbeKey, ProbeResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ProbeResult,
    created_at: Instant,
}

/// Outcome of a cache read, including the entry's age for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh entry found
    Hit {
        /// Stored result
        result: ProbeResult,
        /// Time since the entry was written
        age: Duration,
    },
    /// An entry existed but was older than the TTL and has been evicted
    Expired {
        /// Age of the evicted entry
        age: Duration,
    },
    /// No entry for the key
    Miss,
}

/// Probe results keyed by identifier, one entry per key, last write wins.
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<ProbeKey, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl ResultCache {
    /// Create an unbounded cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: None,
        }
    }

    /// Bound the number of cached keys; the oldest entry is evicted first.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Look up `key`, evicting it if it is older than the TTL.
    ///
    /// An entry is fresh while `now - created_at <= ttl`.
    pub fn lookup(&mut self, key: &ProbeKey, now: Instant) -> CacheLookup {
        let Some(entry) = self.entries.get(key) else {
            return CacheLookup::Miss;
        };

        let age = now.saturating_duration_since(entry.created_at);
        if age > self.ttl {
            self.entries.remove(key);
            return CacheLookup::Expired { age };
        }

        CacheLookup::Hit {
            result: entry.result.clone(),
            age,
        }
    }

    /// Fresh result for `key`, if any. Expired entries read as absent.
    pub fn get(&mut self, key: &ProbeKey, now: Instant) -> Option<ProbeResult> {
        match self.lookup(key, now) {
            CacheLookup::Hit { result, .. } => Some(result),
            CacheLookup::Expired { .. } | CacheLookup::Miss => None,
        }
    }

    /// Store `result` for `key`, replacing any previous entry.
    pub fn put(&mut self, key: ProbeKey, result: ProbeResult, now: Instant) {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                result,
                created_at: now,
            },
        );
    }

    /// Remove one key, or everything when `key` is `None`.
    ///
    /// Returns the number of entries removed. Clearing an absent key is a no-op.
    pub fn clear(&mut self, key: Option<&ProbeKey>) -> usize {
        match key {
            Some(key) => usize::from(self.entries.remove(key).is_some()),
            None => {
                let removed = self.entries.len();
                self.entries.clear();
                removed
            }
        }
    }

    /// Number of stored entries, stale ones included until they are read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            tracing::debug!("Cache full, evicting oldest entry for {}", key);
            self.entries.remove(&key);
        }
    }
}
