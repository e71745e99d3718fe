// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage adapters.
//!
//! The cache store and the mutation queue are both built on a
//! [`StorageAdapter`]. Each keeps its records under a fixed key namespace so
//! neither collides with the other nor with unrelated host data living in
//! the same store.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::Result;

/// Namespace for pending mutation records (`outbox:queue:{id}`).
pub const QUEUE_PREFIX: &str = "outbox:queue:";
/// Namespace for cache entries (`outbox:cache:{key}`).
pub const CACHE_PREFIX: &str = "outbox:cache:";
/// Namespace holding records that could not be decoded.
pub const CORRUPT_PREFIX: &str = "outbox:corrupt:";

/// Platform key-value store the engine persists through.
///
/// Implementations must make each `set` atomic: a reader sees either the old
/// value or the new one, never a mix. Writes must be durable once the call
/// returns.
pub trait StorageAdapter: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key in `keys` as one unit.
    fn multi_remove(&self, keys: &[String]) -> Result<()>;

    /// Lists every key starting with `prefix`, in lexicographic order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Moves an undecodable record into the corrupt namespace.
///
/// Failures are logged and swallowed: quarantine is best effort and must
/// never stop the caller from continuing past the bad record.
pub(crate) fn quarantine(storage: &dyn StorageAdapter, key: &str, bytes: &[u8], reason: &str) {
    tracing::warn!(key, reason, "quarantining corrupt record");
    let target = format!("{CORRUPT_PREFIX}{key}");
    if let Err(e) = storage.set(&target, bytes) {
        tracing::warn!(key, error = %e, "failed to copy corrupt record aside");
        return;
    }
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove corrupt record");
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
