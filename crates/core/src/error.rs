// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for outbox-core operations.

use thiserror::Error;

/// All possible errors that can occur in outbox-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("mutation not found: {0}")]
    MutationNotFound(String),

    #[error("invalid mutation id: '{0}'\n  hint: ids are hyphenated UUIDs as printed by 'outbox enqueue'")]
    InvalidMutationId(String),

    #[error("invalid mutation kind: '{0}'\n  hint: valid kinds are: vote, bookmark, comment, create_post, join_community")]
    InvalidMutationKind(String),

    #[error("invalid mutation status: '{0}'\n  hint: valid statuses are: pending, in_flight, acked, dead_lettered")]
    InvalidStatus(String),

    #[error("invalid vote direction: '{0}'\n  hint: valid directions are: up, down, clear")]
    InvalidVoteDirection(String),

    #[error("invalid status transition for {id}: cannot go from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("mutation {requested} cannot start: {in_flight} is already in flight")]
    AlreadyInFlight { requested: String, in_flight: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted record at '{key}': {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("unsupported record version {found} at '{key}' (this build reads up to {supported})")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },
}

impl Error {
    /// Returns true if the error came from the storage medium itself rather
    /// than from the data stored in it.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Database(_) | Error::Io(_))
    }
}

/// A specialized Result type for outbox-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
