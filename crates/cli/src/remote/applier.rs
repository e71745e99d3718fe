// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`RemoteApplier`] that delivers mutations over a [`Transport`].

use std::future::Future;
use std::pin::Pin;

use outbox_core::protocol::{ClientMessage, ServerMessage};
use outbox_core::PendingMutation;
use outbox_sync::{ApplyError, RemoteApplier};
use tokio::sync::Mutex;

use super::transport::{Transport, WebSocketTransport};

/// Delivers one mutation per request and maps the server's verdict onto
/// [`ApplyError`].
///
/// The connection is opened lazily and reopened after any transport
/// failure. Replies carrying a different mutation id are leftovers from an
/// earlier request that timed out and are skipped.
pub struct WebSocketApplier<T: Transport = WebSocketTransport> {
    url: String,
    transport: Mutex<T>,
}

impl WebSocketApplier<WebSocketTransport> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(url, WebSocketTransport::new())
    }
}

impl<T: Transport> WebSocketApplier<T> {
    pub fn with_transport(url: impl Into<String>, transport: T) -> Self {
        WebSocketApplier {
            url: url.into(),
            transport: Mutex::new(transport),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, mutation: &PendingMutation) -> Result<(), ApplyError> {
        let mut transport = self.transport.lock().await;

        if !transport.is_connected() {
            transport
                .connect(&self.url)
                .await
                .map_err(|e| ApplyError::Retryable(e.to_string()))?;
        }

        if let Err(e) = transport.send(ClientMessage::apply(mutation.clone())).await {
            let _ = transport.close().await;
            return Err(ApplyError::Retryable(e.to_string()));
        }

        loop {
            let reply = match transport.recv().await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    return Err(ApplyError::Retryable(
                        "connection closed before a verdict".to_string(),
                    ));
                }
                Err(e) => {
                    let _ = transport.close().await;
                    return Err(ApplyError::Retryable(e.to_string()));
                }
            };

            match reply.mutation_id() {
                Some(id) if id != mutation.id => {
                    tracing::debug!(%id, expected = %mutation.id, "skipping stale reply");
                }
                None if matches!(reply, ServerMessage::Pong { .. }) => {}
                _ => return verdict(reply),
            }
        }
    }
}

fn verdict(reply: ServerMessage) -> Result<(), ApplyError> {
    match reply {
        ServerMessage::Applied { .. } | ServerMessage::Duplicate { .. } => Ok(()),
        ServerMessage::Rejected { reason, .. } => Err(ApplyError::Terminal(reason)),
        ServerMessage::Unavailable { reason, .. } => Err(ApplyError::Retryable(reason)),
        // A protocol-level error means the server could not make sense of
        // the request; resending the same bytes will not change that.
        ServerMessage::Error { message } => Err(ApplyError::Terminal(message)),
        ServerMessage::Pong { .. } => Err(ApplyError::Retryable(
            "unexpected pong in reply to apply".to_string(),
        )),
    }
}

impl<T: Transport> RemoteApplier for WebSocketApplier<T> {
    fn apply<'a>(
        &'a self,
        mutation: &'a PendingMutation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApplyError>> + Send + 'a>> {
        Box::pin(self.deliver(mutation))
    }
}
