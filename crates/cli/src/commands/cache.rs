// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde::Serialize;

use crate::cli::{CacheCommand, OutputFormat};
use crate::display::format_cache_info;
use crate::error::{Error, Result};

use super::Outbox;

/// JSON shape of `cache get -o json`.
#[derive(Debug, Serialize)]
pub(crate) struct CachedValue {
    pub key: String,
    /// Payload as UTF-8; invalid sequences are replaced.
    pub payload: String,
    pub written_at: chrono::DateTime<chrono::Utc>,
    pub is_stale: bool,
}

pub fn run(state_dir: &Path, command: CacheCommand) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    run_impl(&outbox, command)
}

pub(crate) fn run_impl(outbox: &Outbox, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Get { key, output } => {
            let value = get(outbox, &key)?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
                OutputFormat::Text | OutputFormat::Id => {
                    if value.is_stale {
                        eprintln!("warning: '{}' is stale (written {})", key, value.written_at);
                    }
                    println!("{}", value.payload);
                }
            }
        }
        CacheCommand::Set { key, value } => {
            outbox.cache.set(&key, value.as_bytes())?;
        }
        CacheCommand::Rm { key } => {
            outbox.cache.remove(&key)?;
        }
        CacheCommand::Clear => {
            let removed = outbox.cache.clear()?;
            println!("Removed {removed} cache entries");
        }
        CacheCommand::Info { output } => {
            let info = outbox.cache.size_info()?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
                OutputFormat::Text | OutputFormat::Id => println!("{}", format_cache_info(&info)),
            }
        }
    }
    Ok(())
}

pub(crate) fn get(outbox: &Outbox, key: &str) -> Result<CachedValue> {
    let hit = outbox
        .cache
        .get(key)?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;
    Ok(CachedValue {
        key: key.to_string(),
        payload: String::from_utf8_lossy(&hit.payload).into_owned(),
        written_at: hit.written_at,
        is_stale: hit.is_stale,
    })
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
