// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox-sync: connectivity tracking and queue draining
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  transitions  ┌─────────────────┐  apply(id)  ┌──────────┐
//! │   Network    │──────────────►│ SyncCoordinator │────────────►│  Remote  │
//! │   Monitor    │               │  (drain loop)   │◄────────────│ Applier  │
//! └──────────────┘               └─────────────────┘   verdict   └──────────┘
//!        ▲                               │
//!        │ probe                         ▼ peek / ack / fail
//! ┌──────────────┐               ┌─────────────────┐
//! │ Connectivity │               │  MutationQueue  │
//! │    Source    │               │  (outbox-core)  │
//! └──────────────┘               └─────────────────┘
//! ```

pub mod applier;
pub mod backoff;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod network;

pub use applier::{ApplyError, RemoteApplier};
pub use backoff::Backoff;
pub use config::SyncConfig;
pub use coordinator::{
    Diagnostics, DrainPhase, DrainReport, SyncCoordinator, SyncState, TriggerOutcome,
};
pub use error::{Error, Result};
pub use network::{ConnectivitySource, NetworkMonitor, NetworkState, Subscription};

#[cfg(test)]
mod test_helpers;
