// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of pending mutations.
//!
//! Each mutation is persisted as its own record under
//! `outbox:queue:{id}` before [`MutationQueue::enqueue`] returns, so a crash
//! right after enqueue cannot lose it. The in-memory index is rebuilt from
//! storage on open and is only updated after the matching write succeeds.
//!
//! Replay order is `created_at`, then insertion sequence. At most one
//! mutation is in flight at a time; acked mutations are deleted and
//! dead-lettered ones stay until an operator requeues or purges them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::mutation::{MutationId, MutationPayload, MutationStatus, PendingMutation};
use crate::record::{self, RecordKind};
use crate::storage::{quarantine, StorageAdapter, QUEUE_PREFIX};

type OrderKey = (DateTime<Utc>, u64);

/// What happened to a mutation after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Back to pending; will be retried.
    Retry { attempts: u32 },
    /// Retry budget exhausted; excluded from automatic replay.
    DeadLettered { attempts: u32 },
}

#[derive(Default)]
struct QueueState {
    items: BTreeMap<OrderKey, PendingMutation>,
    index: HashMap<MutationId, OrderKey>,
    next_seq: u64,
    in_flight: Option<MutationId>,
}

impl QueueState {
    fn get(&self, id: &MutationId) -> Option<&PendingMutation> {
        self.index.get(id).and_then(|key| self.items.get(key))
    }

    fn insert(&mut self, mutation: PendingMutation) {
        let key = mutation.order_key();
        if mutation.status == MutationStatus::InFlight {
            self.in_flight = Some(mutation.id);
        }
        self.index.insert(mutation.id, key);
        self.items.insert(key, mutation);
    }

    fn replace(&mut self, mutation: PendingMutation) {
        if self.in_flight == Some(mutation.id) && mutation.status != MutationStatus::InFlight {
            self.in_flight = None;
        }
        self.insert(mutation);
    }

    fn remove(&mut self, id: &MutationId) -> Option<PendingMutation> {
        let key = self.index.remove(id)?;
        if self.in_flight == Some(*id) {
            self.in_flight = None;
        }
        self.items.remove(&key)
    }

    /// Puts an in-flight mutation back to pending without touching storage.
    fn release(&mut self, id: &MutationId) {
        if let Some(key) = self.index.get(id) {
            if let Some(item) = self.items.get_mut(key) {
                if item.status == MutationStatus::InFlight {
                    item.status = MutationStatus::Pending;
                }
            }
        }
        if self.in_flight == Some(*id) {
            self.in_flight = None;
        }
    }

    fn latest_created_at(&self) -> Option<DateTime<Utc>> {
        self.items.keys().next_back().map(|(at, _)| *at)
    }

    fn with_status(&self, status: MutationStatus) -> impl Iterator<Item = &PendingMutation> {
        self.items.values().filter(move |m| m.status == status)
    }
}

/// Returns the storage key for a mutation record.
pub fn queue_key(id: &MutationId) -> String {
    format!("{QUEUE_PREFIX}{id}")
}

/// Ordered, durable log of pending write intents.
pub struct MutationQueue {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn ClockSource>,
    max_retries: u32,
    state: Mutex<QueueState>,
}

impl MutationQueue {
    /// Opens the queue stored in `storage`.
    ///
    /// A mutation is dead-lettered once its failed attempts exceed
    /// `max_retries`.
    pub fn open(storage: Arc<dyn StorageAdapter>, max_retries: u32) -> Result<Self> {
        Self::open_with_clock(storage, Arc::new(SystemClock), max_retries)
    }

    /// Opens the queue with a custom clock source.
    pub fn open_with_clock(
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn ClockSource>,
        max_retries: u32,
    ) -> Result<Self> {
        let queue = MutationQueue {
            storage,
            clock,
            max_retries,
            state: Mutex::new(QueueState::default()),
        };
        queue.load()?;
        Ok(queue)
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, mutation: &PendingMutation) -> Result<()> {
        let bytes = record::encode(RecordKind::Mutation, mutation)?;
        self.storage.set(&queue_key(&mutation.id), &bytes)
    }

    fn load(&self) -> Result<()> {
        let mut state = self.lock();
        let mut max_seq = None;

        for key in self.storage.keys_with_prefix(QUEUE_PREFIX)? {
            let Some(bytes) = self.storage.get(&key)? else {
                continue;
            };
            let mut mutation: PendingMutation =
                match record::decode(&key, RecordKind::Mutation, &bytes) {
                    Ok(m) => m,
                    Err(Error::UnsupportedVersion { found, .. }) => {
                        tracing::warn!(
                            key = %key,
                            version = found,
                            "skipping mutation written by a newer version"
                        );
                        continue;
                    }
                    Err(e) => {
                        quarantine(self.storage.as_ref(), &key, &bytes, &e.to_string());
                        continue;
                    }
                };

            match mutation.status {
                MutationStatus::Acked => {
                    // Ack deletes the record; one still on disk was acked mid-write.
                    self.storage.remove(&key)?;
                    continue;
                }
                MutationStatus::InFlight => {
                    tracing::info!(id = %mutation.id, "recovering interrupted delivery");
                    mutation.status = MutationStatus::Pending;
                    self.persist(&mutation)?;
                }
                MutationStatus::Pending | MutationStatus::DeadLettered => {}
            }

            max_seq = max_seq.max(Some(mutation.seq));
            state.insert(mutation);
        }

        state.next_seq = max_seq.map_or(0, |s| s + 1);
        tracing::debug!(
            pending = state.with_status(MutationStatus::Pending).count(),
            dead_lettered = state.with_status(MutationStatus::DeadLettered).count(),
            "mutation queue loaded"
        );
        Ok(())
    }

    /// Returns the configured retry budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Appends a new mutation and returns its id.
    ///
    /// The record is durable before this returns. `created_at` never goes
    /// backwards relative to mutations already queued, so replay order matches
    /// enqueue order even if the wall clock steps back.
    pub fn enqueue(&self, payload: MutationPayload) -> Result<MutationId> {
        let mut state = self.lock();

        let now = self.clock.now();
        let created_at = match state.latest_created_at() {
            Some(latest) if latest > now => latest,
            _ => now,
        };
        let mutation = PendingMutation::new(payload, created_at, state.next_seq);
        self.persist(&mutation)?;

        let id = mutation.id;
        tracing::debug!(%id, kind = %mutation.kind(), "enqueued mutation");
        state.next_seq += 1;
        state.insert(mutation);
        Ok(id)
    }

    /// Returns the oldest pending mutation, if any.
    pub fn peek_next(&self) -> Option<PendingMutation> {
        self.lock()
            .with_status(MutationStatus::Pending)
            .next()
            .cloned()
    }

    /// Returns the mutation with the given id.
    pub fn get(&self, id: &MutationId) -> Option<PendingMutation> {
        self.lock().get(id).cloned()
    }

    /// Marks a pending mutation as handed to the remote.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyInFlight`] if another mutation is in flight,
    /// [`Error::InvalidTransition`] if this one is not pending.
    pub fn mark_in_flight(&self, id: &MutationId) -> Result<()> {
        let mut state = self.lock();
        let current = state
            .get(id)
            .ok_or_else(|| Error::MutationNotFound(id.to_string()))?;

        if current.status != MutationStatus::Pending {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: current.status.to_string(),
                to: MutationStatus::InFlight.to_string(),
            });
        }
        if let Some(other) = state.in_flight {
            return Err(Error::AlreadyInFlight {
                requested: id.to_string(),
                in_flight: other.to_string(),
            });
        }

        let mut updated = current.clone();
        updated.status = MutationStatus::InFlight;
        self.persist(&updated)?;
        state.replace(updated);
        Ok(())
    }

    /// Confirms a mutation was applied and deletes it.
    ///
    /// Returns false if the id is not in the queue; acking twice is a no-op.
    /// If the delete fails the mutation goes back to pending, to be
    /// re-delivered under the same id.
    pub fn ack(&self, id: &MutationId) -> Result<bool> {
        let mut state = self.lock();
        if state.get(id).is_none() {
            return Ok(false);
        }
        if let Err(e) = self.storage.remove(&queue_key(id)) {
            state.release(id);
            return Err(e);
        }
        state.remove(id);
        tracing::debug!(%id, "acked mutation");
        Ok(true)
    }

    /// Records a retryable delivery failure.
    ///
    /// Increments `attempts` and stores the error. The mutation returns to
    /// pending unless `attempts` now exceeds the retry budget, in which case it
    /// is dead-lettered.
    pub fn fail(&self, id: &MutationId, error: &str) -> Result<FailOutcome> {
        let mut state = self.lock();
        let mut updated = Self::failable(&state, id)?;

        updated.attempts = updated.attempts.saturating_add(1);
        updated.last_error = Some(error.to_string());
        let outcome = if updated.attempts > self.max_retries {
            updated.status = MutationStatus::DeadLettered;
            FailOutcome::DeadLettered {
                attempts: updated.attempts,
            }
        } else {
            updated.status = MutationStatus::Pending;
            FailOutcome::Retry {
                attempts: updated.attempts,
            }
        };

        if let Err(e) = self.persist(&updated) {
            state.release(id);
            return Err(e);
        }
        if let FailOutcome::DeadLettered { attempts } = outcome {
            tracing::warn!(%id, attempts, error, "retry budget exhausted, dead-lettering mutation");
        }
        state.replace(updated);
        Ok(outcome)
    }

    /// Records a terminal failure: the remote will never accept this mutation.
    pub fn dead_letter(&self, id: &MutationId, error: &str) -> Result<()> {
        let mut state = self.lock();
        let mut updated = Self::failable(&state, id)?;

        updated.attempts = updated.attempts.saturating_add(1);
        updated.last_error = Some(error.to_string());
        updated.status = MutationStatus::DeadLettered;

        if let Err(e) = self.persist(&updated) {
            state.release(id);
            return Err(e);
        }
        tracing::warn!(%id, error, "dead-lettering rejected mutation");
        state.replace(updated);
        Ok(())
    }

    fn failable(state: &QueueState, id: &MutationId) -> Result<PendingMutation> {
        let current = state
            .get(id)
            .ok_or_else(|| Error::MutationNotFound(id.to_string()))?;
        match current.status {
            MutationStatus::Pending | MutationStatus::InFlight => Ok(current.clone()),
            status => Err(Error::InvalidTransition {
                id: id.to_string(),
                from: status.to_string(),
                to: MutationStatus::DeadLettered.to_string(),
            }),
        }
    }

    /// Removes a mutation that has not been sent yet.
    ///
    /// Returns false if the mutation is in flight, dead-lettered, or no longer
    /// in the queue.
    pub fn cancel(&self, id: &MutationId) -> Result<bool> {
        let mut state = self.lock();
        match state.get(id) {
            Some(m) if m.status == MutationStatus::Pending => {}
            _ => return Ok(false),
        }
        self.storage.remove(&queue_key(id))?;
        state.remove(id);
        tracing::debug!(%id, "cancelled mutation");
        Ok(true)
    }

    /// Returns dead-lettered mutations in replay order.
    pub fn list_dead_lettered(&self) -> Vec<PendingMutation> {
        self.lock()
            .with_status(MutationStatus::DeadLettered)
            .cloned()
            .collect()
    }

    /// Returns mutations still awaiting delivery (pending or in flight), in
    /// replay order.
    pub fn list_pending(&self) -> Vec<PendingMutation> {
        self.lock()
            .items
            .values()
            .filter(|m| m.status != MutationStatus::DeadLettered)
            .cloned()
            .collect()
    }

    /// Number of mutations awaiting delivery (pending or in flight).
    pub fn pending_count(&self) -> usize {
        self.lock()
            .items
            .values()
            .filter(|m| m.status != MutationStatus::DeadLettered)
            .count()
    }

    /// Number of dead-lettered mutations.
    pub fn dead_letter_count(&self) -> usize {
        self.lock()
            .with_status(MutationStatus::DeadLettered)
            .count()
    }

    /// Total number of records, dead letters included.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns true if the queue holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the id of the in-flight mutation, if any.
    pub fn in_flight(&self) -> Option<MutationId> {
        self.lock().in_flight
    }

    /// Puts a dead-lettered mutation back in line with a fresh retry budget.
    ///
    /// It keeps its original position in replay order. Returns false if the
    /// id is not dead-lettered.
    pub fn requeue_dead_lettered(&self, id: &MutationId) -> Result<bool> {
        let mut state = self.lock();
        let mut updated = match state.get(id) {
            Some(m) if m.status == MutationStatus::DeadLettered => m.clone(),
            _ => return Ok(false),
        };
        updated.status = MutationStatus::Pending;
        updated.attempts = 0;
        self.persist(&updated)?;
        tracing::info!(%id, "requeued dead-lettered mutation");
        state.replace(updated);
        Ok(true)
    }

    /// Deletes dead-lettered mutations: the given one, or all of them.
    ///
    /// Returns how many were removed.
    pub fn purge_dead_lettered(&self, id: Option<&MutationId>) -> Result<usize> {
        let mut state = self.lock();
        let ids: Vec<MutationId> = state
            .with_status(MutationStatus::DeadLettered)
            .map(|m| m.id)
            .filter(|candidate| id.map_or(true, |wanted| wanted == candidate))
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = ids.iter().map(queue_key).collect();
        self.storage.multi_remove(&keys)?;
        for id in &ids {
            state.remove(id);
        }
        tracing::info!(count = ids.len(), "purged dead-lettered mutations");
        Ok(ids.len())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
