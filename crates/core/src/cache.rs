// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Last-known-good read cache.
//!
//! Entries live under `outbox:cache:{key}`. Reads never fail because an
//! entry is old: staleness is reported next to the payload and the caller
//! decides what to do with it.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::record::{self, RecordKind};
use crate::storage::{quarantine, StorageAdapter, CACHE_PREFIX};

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which an entry is reported stale.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_stale_after_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl CacheConfig {
    /// The staleness threshold as a duration.
    pub fn stale_after(&self) -> Duration {
        let secs = i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(i64::MAX / 1000))
    }
}

/// A cached payload together with when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    pub payload: Vec<u8>,
    pub written_at: DateTime<Utc>,
    /// True once the entry is older than the configured threshold.
    pub is_stale: bool,
}

/// Entry count and total payload size, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizeInfo {
    pub entries: usize,
    pub payload_bytes: u64,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    /// Hex-encoded payload bytes.
    payload: String,
    written_at: DateTime<Utc>,
}

/// Returns the storage key for a cache entry.
pub fn cache_key(key: &str) -> String {
    format!("{CACHE_PREFIX}{key}")
}

/// Durable key to payload map with advisory staleness.
pub struct CacheStore {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn ClockSource>,
    stale_after: Duration,
    writes: Mutex<()>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, config: &CacheConfig) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn ClockSource>,
        config: &CacheConfig,
    ) -> Self {
        CacheStore {
            storage,
            clock,
            stale_after: config.stale_after(),
            writes: Mutex::new(()),
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    ///
    /// If the write fails the previous entry is left as it was.
    pub fn set(&self, key: &str, payload: &[u8]) -> Result<()> {
        // Stamped under the lock: the last persisted write carries the newest time.
        let _guard = self.writes.lock().unwrap_or_else(|e| e.into_inner());
        let entry = StoredEntry {
            key: key.to_string(),
            payload: hex::encode(payload),
            written_at: self.clock.now(),
        };
        let bytes = record::encode(RecordKind::CacheEntry, &entry)?;
        self.storage.set(&cache_key(key), &bytes)?;
        tracing::debug!(key, bytes = payload.len(), "cache set");
        Ok(())
    }

    /// Serializes `value` as JSON and stores it under `key`.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &serde_json::to_vec(value)?)
    }

    /// Reads the entry under `key`, however old it is.
    ///
    /// Returns `None` for a missing key and for a record that cannot be
    /// decoded; the latter is moved to the corrupt namespace.
    pub fn get(&self, key: &str) -> Result<Option<CacheHit>> {
        let storage_key = cache_key(key);
        let Some(entry) = self.read(&storage_key)? else {
            return Ok(None);
        };
        let Ok(payload) = hex::decode(&entry.payload) else {
            quarantine(
                self.storage.as_ref(),
                &storage_key,
                &self.storage.get(&storage_key)?.unwrap_or_default(),
                "payload is not valid hex",
            );
            return Ok(None);
        };

        let age = self.clock.now() - entry.written_at;
        Ok(Some(CacheHit {
            payload,
            written_at: entry.written_at,
            is_stale: age > self.stale_after,
        }))
    }

    /// Reads and deserializes a JSON entry stored with [`set_json`](Self::set_json).
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(hit) => Ok(Some(serde_json::from_slice(&hit.payload)?)),
            None => Ok(None),
        }
    }

    fn read(&self, storage_key: &str) -> Result<Option<StoredEntry>> {
        let Some(bytes) = self.storage.get(storage_key)? else {
            return Ok(None);
        };
        match record::decode(storage_key, RecordKind::CacheEntry, &bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(Error::UnsupportedVersion { found, .. }) => {
                tracing::warn!(key = %storage_key, version = found, "ignoring cache entry written by a newer version");
                Ok(None)
            }
            Err(e) if e.is_storage_failure() => Err(e),
            Err(e) => {
                quarantine(self.storage.as_ref(), storage_key, &bytes, &e.to_string());
                Ok(None)
            }
        }
    }

    /// Removes the entry under `key`. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.writes.lock().unwrap_or_else(|e| e.into_inner());
        self.storage.remove(&cache_key(key))
    }

    /// Removes every cache entry. Other namespaces are untouched.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize> {
        let _guard = self.writes.lock().unwrap_or_else(|e| e.into_inner());
        let keys = self.storage.keys_with_prefix(CACHE_PREFIX)?;
        if !keys.is_empty() {
            self.storage.multi_remove(&keys)?;
        }
        tracing::debug!(count = keys.len(), "cache cleared");
        Ok(keys.len())
    }

    /// Lists cached keys in lexicographic order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .keys_with_prefix(CACHE_PREFIX)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(CACHE_PREFIX).map(str::to_string))
            .collect())
    }

    /// Sum of stored payload sizes in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        Ok(self.size_info()?.payload_bytes)
    }

    pub fn size_info(&self) -> Result<CacheSizeInfo> {
        let mut info = CacheSizeInfo::default();
        for storage_key in self.storage.keys_with_prefix(CACHE_PREFIX)? {
            if let Some(entry) = self.read(&storage_key)? {
                info.entries += 1;
                info.payload_bytes += (entry.payload.len() / 2) as u64;
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
