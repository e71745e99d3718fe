// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host configuration.
//!
//! Configuration lives in `outbox.toml` inside the state directory, next to
//! the `outbox.db` store:
//! - `[sync]`: retry budget, timeouts and backoff for draining
//! - `[cache]`: staleness threshold for cached reads
//! - `[remote]`: the WebSocket url mutations are applied against
//!
//! A missing file means every default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use outbox_core::CacheConfig;
use outbox_sync::SyncConfig;

use crate::env;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "outbox.toml";
const DB_FILE_NAME: &str = "outbox.db";
const LOG_FILE_NAME: &str = "outbox.log";

/// Host configuration stored in `outbox.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Remote authority; absent means `outbox sync` needs `--url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Remote authority settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket url, `ws://...` or `wss://...`.
    pub url: String,
    /// How long a connectivity probe may take (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Config {
    /// Loads configuration from the given state directory.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given state directory.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(state_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    /// Returns the remote URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }

    pub fn probe_timeout_ms(&self) -> u64 {
        self.remote
            .as_ref()
            .map_or_else(default_probe_timeout_ms, |r| r.probe_timeout_ms)
    }

    /// Picks the remote url: explicit flag, then environment, then config.
    pub fn resolve_remote_url(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(env::remote_url)
            .or_else(|| self.remote_url().map(str::to_string))
            .ok_or(Error::NoRemote)
    }
}

/// Resolves the state directory.
///
/// Order: explicit path, `OUTBOX_STATE_DIR`, `$XDG_STATE_HOME/outbox`,
/// the platform state dir, then `~/.local/state/outbox`.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(dir) = env::state_dir() {
        return dir;
    }
    if let Some(dir) = env::xdg_state_home() {
        return dir.join("outbox");
    }
    if let Some(dir) = dirs::state_dir() {
        return dir.join("outbox");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/outbox"))
        .unwrap_or_else(|| PathBuf::from(".local/state/outbox"))
}

/// Path of the key-value store inside the state directory.
pub fn db_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DB_FILE_NAME)
}

pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
