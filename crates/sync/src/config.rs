// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine settings.
//!
//! Hosts usually embed this as the `[sync]` table of their own config file;
//! every field has a default so an empty table is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

/// Tunables for the coordinator and network monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Retryable failures tolerated before a mutation is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upper bound on a single remote apply call (milliseconds).
    #[serde(default = "default_apply_timeout_ms")]
    pub apply_timeout_ms: u64,
    /// Delay after the first retryable failure (milliseconds).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap on the backoff delay (seconds).
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// How often a connectivity source is probed (milliseconds).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Transitions buffered per network subscriber before the oldest are dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

fn default_max_retries() -> u32 {
    5
}

fn default_apply_timeout_ms() -> u64 {
    10_000
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    300
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_subscriber_buffer() -> usize {
    8
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: default_max_retries(),
            apply_timeout_ms: default_apply_timeout_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            probe_interval_ms: default_probe_interval_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

impl SyncConfig {
    pub fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }

    /// The retry delay policy described by this config.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_secs(self.max_backoff_secs),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
