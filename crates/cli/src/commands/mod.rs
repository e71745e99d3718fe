// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod config;
pub mod enqueue;
pub mod queue;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use outbox_core::{CacheStore, MutationId, MutationQueue, SqliteStorage, StorageAdapter};

use crate::config::{db_path, Config};
use crate::error::Result;

/// Everything a command needs from one state directory.
pub struct Outbox {
    pub state_dir: PathBuf,
    pub config: Config,
    pub queue: Arc<MutationQueue>,
    pub cache: Arc<CacheStore>,
}

impl Outbox {
    /// Opens (creating if needed) the store under `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        let config = Config::load(state_dir)?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::open(&db_path(state_dir))?);
        let queue = MutationQueue::open(Arc::clone(&storage), config.sync.max_retries)?;
        let cache = CacheStore::new(storage, &config.cache);
        tracing::debug!(
            state_dir = %state_dir.display(),
            pending = queue.pending_count(),
            "opened outbox"
        );
        Ok(Outbox {
            state_dir: state_dir.to_path_buf(),
            config,
            queue: Arc::new(queue),
            cache: Arc::new(cache),
        })
    }
}

/// Parses a mutation id given on the command line.
pub fn parse_id(id: &str) -> Result<MutationId> {
    Ok(id.parse()?)
}
