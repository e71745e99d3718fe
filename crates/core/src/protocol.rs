// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between a device and the remote authority.
//!
//! The protocol is request/response:
//! - Client sends one `Apply` per mutation and waits for the verdict
//! - Server answers with the outcome keyed by the mutation id
//!
//! The id doubles as the idempotency key: a server that has already applied
//! an id answers `Duplicate` instead of applying it again.

use serde::{Deserialize, Serialize};

use crate::mutation::{MutationId, PendingMutation};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Apply one queued mutation.
    Apply { mutation: PendingMutation },

    /// Ping message for keepalive and reachability checks.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The mutation was applied.
    Applied { id: MutationId },

    /// The mutation id was applied earlier; nothing changed.
    Duplicate { id: MutationId },

    /// The server will never accept this mutation.
    Rejected { id: MutationId, reason: String },

    /// The server could not apply the mutation right now; try again later.
    Unavailable { id: MutationId, reason: String },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message for requests that could not be understood.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates an Apply message.
    pub fn apply(mutation: PendingMutation) -> Self {
        ClientMessage::Apply { mutation }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn applied(id: MutationId) -> Self {
        ServerMessage::Applied { id }
    }

    pub fn duplicate(id: MutationId) -> Self {
        ServerMessage::Duplicate { id }
    }

    pub fn rejected(id: MutationId, reason: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            id,
            reason: reason.into(),
        }
    }

    pub fn unavailable(id: MutationId, reason: impl Into<String>) -> Self {
        ServerMessage::Unavailable {
            id,
            reason: reason.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Returns the mutation id this message answers, if any.
    pub fn mutation_id(&self) -> Option<MutationId> {
        match self {
            ServerMessage::Applied { id }
            | ServerMessage::Duplicate { id }
            | ServerMessage::Rejected { id, .. }
            | ServerMessage::Unavailable { id, .. } => Some(*id),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
