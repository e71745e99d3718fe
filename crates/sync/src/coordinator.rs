// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drains the mutation queue against the remote.
//!
//! The coordinator is a small state machine:
//!
//! ```text
//!            online / sync_now
//!   Idle ───────────────────────► Draining ──── queue empty ───► Idle
//!    ▲                             │    ▲
//!    │          retryable failure  │    │ timer / online / sync_now
//!    │          or storage error   ▼    │
//!    └──────────────────────── Backoff { until }
//! ```
//!
//! Only one drain runs at a time per coordinator; a trigger that finds one
//! already running is a no-op. Mutations are applied strictly in queue order.
//! A terminal failure dead-letters the mutation and the drain moves on; a
//! retryable failure or a queue storage error stops the drain and schedules
//! the next attempt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use outbox_core::{
    CacheSizeInfo, CacheStore, ClockSource, FailOutcome, MutationId, MutationQueue,
    PendingMutation, SystemClock,
};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::applier::{ApplyError, RemoteApplier};
use crate::backoff::Backoff;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::network::{NetworkMonitor, NetworkState, Subscription};

/// Where the drain state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DrainPhase {
    Idle,
    Draining,
    /// Waiting to retry after a retryable failure.
    Backoff { until: DateTime<Utc> },
}

/// Process-wide sync status for observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub is_online: bool,
    pub is_syncing: bool,
    /// When a drain last emptied the queue.
    pub last_sync_at: Option<DateTime<Utc>>,
    pub pending_count: usize,
    pub dead_letter_count: usize,
}

/// What one drain pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Mutations the remote confirmed.
    pub applied: usize,
    /// Mutations dead-lettered during this pass.
    pub dead_lettered: Vec<MutationId>,
    /// Set when the pass stopped on a retryable failure.
    pub retry_scheduled: Option<Duration>,
    /// Every mutation handed to the applier, in call order.
    pub order: Vec<MutationId>,
}

/// Result of asking for a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Drained(DrainReport),
    /// Another drain was in progress; nothing was started.
    AlreadyRunning,
    /// The network monitor reports offline; nothing was started.
    Offline,
}

/// Read-only view for settings and debug screens.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub queue_depth: usize,
    pub dead_lettered: Vec<PendingMutation>,
    pub cache: Option<CacheSizeInfo>,
    pub phase: DrainPhase,
    pub state: SyncState,
}

struct Schedule {
    phase: DrainPhase,
    retry_at: Option<Instant>,
}

/// Clears the drain flag when a pass ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the drain loop for one mutation queue.
pub struct SyncCoordinator {
    queue: Arc<MutationQueue>,
    monitor: Arc<NetworkMonitor>,
    applier: Arc<dyn RemoteApplier>,
    cache: Option<Arc<CacheStore>>,
    clock: Arc<dyn ClockSource>,
    apply_timeout: Duration,
    backoff: Backoff,
    draining: AtomicBool,
    schedule: Mutex<Schedule>,
    state_tx: watch::Sender<SyncState>,
    wake: Notify,
    /// Signals `run` that the retry deadline changed.
    rescheduled: Notify,
}

impl SyncCoordinator {
    pub fn new(
        queue: Arc<MutationQueue>,
        monitor: Arc<NetworkMonitor>,
        applier: Arc<dyn RemoteApplier>,
        config: &SyncConfig,
    ) -> Self {
        Self::with_clock(queue, monitor, applier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        queue: Arc<MutationQueue>,
        monitor: Arc<NetworkMonitor>,
        applier: Arc<dyn RemoteApplier>,
        config: &SyncConfig,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SyncState::default());
        let coordinator = SyncCoordinator {
            queue,
            monitor,
            applier,
            cache: None,
            clock,
            apply_timeout: config.apply_timeout(),
            backoff: config.backoff(),
            draining: AtomicBool::new(false),
            schedule: Mutex::new(Schedule {
                phase: DrainPhase::Idle,
                retry_at: None,
            }),
            state_tx,
            wake: Notify::new(),
            rescheduled: Notify::new(),
        };
        coordinator.publish();
        coordinator
    }

    /// Attaches the cache so diagnostics can report its size.
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn queue(&self) -> &Arc<MutationQueue> {
        &self.queue
    }

    pub fn phase(&self) -> DrainPhase {
        self.lock_schedule().phase
    }

    /// Current sync status, with queue counts refreshed.
    pub fn state(&self) -> SyncState {
        self.publish();
        self.state_tx.borrow().clone()
    }

    /// Subscribes to sync status changes.
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// Asks a running [`run`](Self::run) loop to drain soon.
    pub fn request_sync(&self) {
        self.wake.notify_one();
    }

    pub fn diagnostics(&self) -> Result<Diagnostics> {
        let cache = match &self.cache {
            Some(cache) => Some(cache.size_info().map_err(Error::Cache)?),
            None => None,
        };
        Ok(Diagnostics {
            queue_depth: self.queue.pending_count(),
            dead_lettered: self.queue.list_dead_lettered(),
            cache,
            phase: self.phase(),
            state: self.state(),
        })
    }

    fn lock_schedule(&self) -> std::sync::MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: DrainPhase, retry_at: Option<Instant>) {
        let mut schedule = self.lock_schedule();
        schedule.phase = phase;
        schedule.retry_at = retry_at;
    }

    fn publish(&self) {
        let is_online = self.monitor.current_state().is_online();
        let is_syncing = self.draining.load(Ordering::Acquire);
        let pending_count = self.queue.pending_count();
        let dead_letter_count = self.queue.dead_letter_count();
        self.state_tx.send_if_modified(|state| {
            let next = SyncState {
                is_online,
                is_syncing,
                last_sync_at: state.last_sync_at,
                pending_count,
                dead_letter_count,
            };
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Drains the queue now, unless offline or a drain is already running.
    ///
    /// A pending backoff is skipped: an explicit trigger retries immediately.
    /// A storage error aborts the pass and enters backoff, as a retryable
    /// apply failure does.
    pub async fn sync_now(&self) -> Result<TriggerOutcome> {
        if !self.monitor.current_state().is_online() {
            self.publish();
            return Ok(TriggerOutcome::Offline);
        }
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("drain already running");
            return Ok(TriggerOutcome::AlreadyRunning);
        }

        let guard = DrainGuard(&self.draining);
        self.set_phase(DrainPhase::Draining, None);
        self.publish();
        tracing::info!(pending = self.queue.pending_count(), "drain started");

        let mut report = DrainReport::default();
        let result = self.drain(&mut report).await;
        drop(guard);

        match result {
            Ok(()) => {
                tracing::info!(
                    applied = report.applied,
                    dead_lettered = report.dead_lettered.len(),
                    retry_in_ms = report.retry_scheduled.map(|d| d.as_millis() as u64),
                    "drain finished"
                );
                self.publish();
                Ok(TriggerOutcome::Drained(report))
            }
            Err(e) => {
                let delay = self.backoff.delay(1);
                tracing::warn!(
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "drain aborted"
                );
                self.schedule_retry(delay);
                self.publish();
                Err(e)
            }
        }
    }

    async fn drain(&self, report: &mut DrainReport) -> Result<()> {
        loop {
            let Some(next) = self.queue.peek_next() else {
                let now = self.clock.now();
                self.set_phase(DrainPhase::Idle, None);
                self.state_tx.send_modify(|state| state.last_sync_at = Some(now));
                return Ok(());
            };

            self.queue.mark_in_flight(&next.id)?;
            report.order.push(next.id);
            tracing::debug!(id = %next.id, kind = %next.kind(), attempts = next.attempts, "applying mutation");

            match self.apply_one(&next).await {
                Ok(()) => {
                    self.queue.ack(&next.id)?;
                    report.applied += 1;
                }
                Err(ApplyError::Terminal(reason)) => {
                    self.queue.dead_letter(&next.id, &reason)?;
                    report.dead_lettered.push(next.id);
                }
                Err(ApplyError::Retryable(reason)) => {
                    tracing::warn!(id = %next.id, reason = %reason, "retryable apply failure");
                    match self.queue.fail(&next.id, &reason)? {
                        FailOutcome::DeadLettered { .. } => {
                            report.dead_lettered.push(next.id);
                        }
                        FailOutcome::Retry { attempts } => {
                            let delay = self.backoff.delay(attempts);
                            self.schedule_retry(delay);
                            report.retry_scheduled = Some(delay);
                            return Ok(());
                        }
                    }
                }
            }
            self.publish();
        }
    }

    fn schedule_retry(&self, delay: Duration) {
        let now = self.clock.now();
        let until = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off");
        self.set_phase(DrainPhase::Backoff { until }, Some(Instant::now() + delay));
        self.rescheduled.notify_one();
    }

    /// Runs the applier under the timeout, giving up early if the network
    /// drops. Both count as retryable.
    async fn apply_one(&self, mutation: &PendingMutation) -> std::result::Result<(), ApplyError> {
        let mut network = self.monitor.subscribe();
        tokio::select! {
            biased;
            result = tokio::time::timeout(self.apply_timeout, self.applier.apply(mutation)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ApplyError::Retryable(format!(
                        "timed out after {}ms",
                        self.apply_timeout.as_millis()
                    ))),
                }
            }
            _ = went_offline(&mut network) => {
                Err(ApplyError::Retryable("connectivity lost during apply".to_string()))
            }
        }
    }

    /// Drives the coordinator until `cancel` fires.
    ///
    /// Drains on every offline to online transition, on
    /// [`request_sync`](Self::request_sync), and when a backoff expires,
    /// including a backoff scheduled by a [`sync_now`](Self::sync_now) call
    /// made outside this loop.
    /// Drain errors are logged and do not stop the loop. Cancellation is
    /// observed between drains.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut network = self.monitor.subscribe();
        let mut online = false;

        loop {
            let retry_at = self.lock_schedule().retry_at;
            tokio::select! {
                _ = cancel.cancelled() => break,
                state = network.recv() => match state {
                    Some(NetworkState::Online) => {
                        let came_online = !online;
                        online = true;
                        self.publish();
                        if came_online {
                            self.trigger("came online").await;
                        }
                    }
                    Some(NetworkState::Offline) => {
                        online = false;
                        self.publish();
                    }
                    None => break,
                },
                _ = self.wake.notified() => self.trigger("requested").await,
                _ = self.rescheduled.notified() => {}
                _ = sleep_until(retry_at), if retry_at.is_some() => {
                    self.lock_schedule().retry_at = None;
                    self.trigger("backoff elapsed").await;
                }
            }
        }
        tracing::debug!("sync coordinator stopped");
    }

    async fn trigger(&self, reason: &'static str) {
        tracing::debug!(reason, "sync triggered");
        if let Err(e) = self.sync_now().await {
            tracing::warn!(reason, error = %e, "sync failed");
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn went_offline(network: &mut Subscription) {
    loop {
        match network.recv().await {
            Some(NetworkState::Offline) => return,
            Some(NetworkState::Online) => continue,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
