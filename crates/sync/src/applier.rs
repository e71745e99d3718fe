// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the engine and the remote authority.

use std::future::Future;
use std::pin::Pin;

use outbox_core::PendingMutation;

/// Why a remote apply did not succeed, as classified by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Worth trying again later: timeouts, unavailable servers, lost links.
    #[error("retryable: {0}")]
    Retryable(String),

    /// The remote will never accept this mutation.
    #[error("terminal: {0}")]
    Terminal(String),
}

impl ApplyError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplyError::Terminal(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            ApplyError::Retryable(reason) | ApplyError::Terminal(reason) => reason,
        }
    }
}

/// Turns one queued mutation into exactly one remote write.
///
/// Implementations must be idempotent with respect to `mutation.id`: the
/// same id may be delivered again after a timeout or a crash, and applying
/// it twice must have the effect of applying it once.
pub trait RemoteApplier: Send + Sync {
    fn apply<'a>(
        &'a self,
        mutation: &'a PendingMutation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApplyError>> + Send + 'a>>;
}
