// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity observation.
//!
//! The host pushes what it learns about the network into a
//! [`NetworkMonitor`], either directly through [`NetworkMonitor::report`] or
//! by handing it a [`ConnectivitySource`] to poll. Observers get a
//! [`Subscription`] that yields the current state first and then every
//! transition.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Whether a usable network path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    Online,
    Offline,
}

impl NetworkState {
    pub fn is_online(self) -> bool {
        self == NetworkState::Online
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkState::Online => "online",
            NetworkState::Offline => "offline",
        }
    }
}

impl From<bool> for NetworkState {
    fn from(online: bool) -> Self {
        if online {
            NetworkState::Online
        } else {
            NetworkState::Offline
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied "is there a usable network path" signal.
pub trait ConnectivitySource: Send + Sync {
    /// Checks connectivity once.
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Current connectivity plus a stream of transitions.
pub struct NetworkMonitor {
    state: Mutex<NetworkState>,
    tx: broadcast::Sender<NetworkState>,
}

impl NetworkMonitor {
    /// Creates a monitor starting in `initial`.
    ///
    /// `buffer` bounds how many transitions a slow subscriber may fall behind
    /// before the oldest are discarded.
    pub fn new(initial: NetworkState, buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        NetworkMonitor {
            state: Mutex::new(initial),
            tx,
        }
    }

    /// Records an observation. Returns true if it was a transition.
    pub fn report(&self, observed: NetworkState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == observed {
            return false;
        }
        *state = observed;
        tracing::info!(state = %observed, "connectivity changed");
        // No subscribers is fine
        let _ = self.tx.send(observed);
        true
    }

    pub fn current_state(&self) -> NetworkState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribes to transitions. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        // Snapshot and subscribe under the lock so no transition falls between them
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Subscription {
            pending: Some(*state),
            last: None,
            rx: self.tx.subscribe(),
        }
    }

    /// Polls `source` every `interval` and reports what it sees, until
    /// `cancel` fires. The first probe runs immediately.
    pub fn spawn_poller(
        self: &Arc<Self>,
        source: Arc<dyn ConnectivitySource>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let online = tokio::select! {
                            _ = cancel.cancelled() => break,
                            online = source.probe() => online,
                        };
                        monitor.report(NetworkState::from(online));
                    }
                }
            }
            tracing::debug!("connectivity poller stopped");
        })
    }
}

/// A stream of connectivity states for one observer.
pub struct Subscription {
    pending: Option<NetworkState>,
    last: Option<NetworkState>,
    rx: broadcast::Receiver<NetworkState>,
}

impl Subscription {
    /// Waits for the next state.
    ///
    /// The first call returns the state at subscription time. Later calls
    /// return transitions in order; if this subscriber fell too far behind,
    /// the oldest missed transitions are skipped but the latest never is.
    /// Returns `None` once the monitor is gone.
    pub async fn recv(&mut self) -> Option<NetworkState> {
        if let Some(state) = self.pending.take() {
            self.last = Some(state);
            return Some(state);
        }
        loop {
            match self.rx.recv().await {
                Ok(state) if Some(state) == self.last => continue,
                Ok(state) => {
                    self.last = Some(state);
                    return Some(state);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "network subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
