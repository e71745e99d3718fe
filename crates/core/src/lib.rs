// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox-core: durable building blocks of the offline sync engine
//!
//! This crate provides the mutation model, the storage adapters and record
//! format, the read cache and the pending-mutation queue. The sync
//! coordinator, the CLI and the reference remote all build on it.

pub mod cache;
pub mod clock;
pub mod error;
pub mod mutation;
pub mod protocol;
pub mod queue;
pub mod record;
pub mod storage;

pub use cache::{CacheConfig, CacheHit, CacheSizeInfo, CacheStore};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use mutation::{
    MutationId, MutationKind, MutationPayload, MutationStatus, PendingMutation, VoteDirection,
};
pub use protocol::{ClientMessage, ServerMessage};
pub use queue::{FailOutcome, MutationQueue};
pub use storage::{MemoryStorage, SqliteStorage, StorageAdapter};
