// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Talking to the remote authority.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncCoordinator │────►│  Applier    │────►│  Transport  │────► outbox-remote
//! │  (outbox-sync)  │◄────│ (WebSocket) │◄────│   (trait)   │◄────
//! └─────────────────┘     └─────────────┘     └─────────────┘
//!          ▲
//!          │ online / offline
//! ┌─────────────────┐
//! │    TcpProbe     │
//! └─────────────────┘
//! ```

mod applier;
mod probe;
mod transport;

pub use applier::WebSocketApplier;
pub use probe::TcpProbe;
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};
