// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the outbox CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] outbox_core::Error),

    #[error(transparent)]
    Sync(#[from] outbox_sync::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("no remote configured\n  hint: pass --url ws://host:port, set OUTBOX_REMOTE_URL, or add [remote] url to outbox.toml")]
    NoRemote,

    #[error("invalid remote url '{url}': {reason}\n  hint: remote urls look like ws://host:port or wss://host")]
    InvalidRemoteUrl { url: String, reason: String },

    #[error("another sync is already draining this outbox\n  hint: wait for it to finish or stop the running 'outbox sync --watch'")]
    DrainLocked,

    #[error("cannot cancel {0}: it is not pending\n  hint: only mutations that have not been sent can be cancelled; see 'outbox pending'")]
    NotCancellable(String),

    #[error("{0} is not dead-lettered\n  hint: see 'outbox dead' for mutations that can be requeued")]
    NotDeadLettered(String),

    #[error("cache key not found: {0}")]
    CacheMiss(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
