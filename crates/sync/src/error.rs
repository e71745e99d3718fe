// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for outbox-sync operations.

use thiserror::Error;

/// Errors that abort a drain pass.
///
/// Remote failures are not errors at this level: they are classified by the
/// applier and recorded on the mutation. What remains are failures of the
/// local stores the coordinator drives.
#[derive(Debug, Error)]
pub enum Error {
    #[error("queue error: {0}")]
    Queue(#[from] outbox_core::Error),

    #[error("cache error: {0}")]
    Cache(outbox_core::Error),
}

impl Error {
    /// Returns true if the local storage medium failed.
    pub fn is_storage_failure(&self) -> bool {
        match self {
            Error::Queue(e) | Error::Cache(e) => e.is_storage_failure(),
        }
    }
}

/// A specialized Result type for outbox-sync operations.
pub type Result<T> = std::result::Result<T, Error>;
