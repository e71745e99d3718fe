// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the sync crate.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use outbox_core::{MemoryStorage, MutationId, MutationPayload, MutationQueue, PendingMutation};
use tokio::sync::Notify;

use crate::applier::{ApplyError, RemoteApplier};
use crate::network::ConnectivitySource;

/// What the scripted applier does with one call.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed,
    Retryable(&'static str),
    Terminal(&'static str),
    /// Sleep before succeeding.
    Delay(Duration),
    /// Never complete.
    Hang,
}

/// Applier that replays a script and records what it was asked to apply.
///
/// Calls beyond the script succeed. Per-id overrides take precedence over
/// the shared script.
#[derive(Default)]
pub struct ScriptedApplier {
    script: Mutex<VecDeque<Step>>,
    by_payload: Mutex<Vec<(MutationPayload, Step)>>,
    calls: Mutex<Vec<PendingMutation>>,
    active: AtomicUsize,
    overlapped: AtomicBool,
    started: Notify,
}

impl ScriptedApplier {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        let applier = ScriptedApplier::default();
        applier.script.lock().unwrap().extend(steps);
        Arc::new(applier)
    }

    /// Always answers `step` for a mutation with this payload.
    pub fn on_payload(&self, payload: MutationPayload, step: Step) {
        self.by_payload.lock().unwrap().push((payload, step));
    }

    pub fn calls(&self) -> Vec<PendingMutation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_ids(&self) -> Vec<MutationId> {
        self.calls().into_iter().map(|m| m.id).collect()
    }

    /// True if two applies were ever running at once.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    /// Resolves once the next apply call has started.
    pub async fn started(&self) {
        self.started.notified().await;
    }

    fn next_step(&self, mutation: &PendingMutation) -> Step {
        let overrides = self.by_payload.lock().unwrap();
        if let Some((_, step)) = overrides.iter().find(|(p, _)| *p == mutation.payload) {
            return step.clone();
        }
        drop(overrides);
        self.script.lock().unwrap().pop_front().unwrap_or(Step::Succeed)
    }
}

impl RemoteApplier for ScriptedApplier {
    fn apply<'a>(
        &'a self,
        mutation: &'a PendingMutation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApplyError>> + Send + 'a>> {
        Box::pin(async move {
            if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.calls.lock().unwrap().push(mutation.clone());
            let step = self.next_step(mutation);
            self.started.notify_one();

            let result = match step {
                Step::Succeed => Ok(()),
                Step::Retryable(reason) => Err(ApplyError::Retryable(reason.to_string())),
                Step::Terminal(reason) => Err(ApplyError::Terminal(reason.to_string())),
                Step::Delay(d) => {
                    tokio::time::sleep(d).await;
                    Ok(())
                }
                Step::Hang => std::future::pending().await,
            };
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// Connectivity source that replays a list of probe results, repeating the
/// last one forever.
pub struct ScriptedSource {
    results: Mutex<VecDeque<bool>>,
    last: AtomicBool,
    probes: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(results: impl IntoIterator<Item = bool>) -> Arc<Self> {
        Arc::new(ScriptedSource {
            results: Mutex::new(results.into_iter().collect()),
            last: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
        })
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ConnectivitySource for ScriptedSource {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop_front();
            match next {
                Some(online) => {
                    self.last.store(online, Ordering::SeqCst);
                    online
                }
                None => self.last.load(Ordering::SeqCst),
            }
        })
    }
}

pub fn memory_queue(max_retries: u32) -> (MemoryStorage, Arc<MutationQueue>) {
    let storage = MemoryStorage::new();
    let queue = MutationQueue::open(Arc::new(storage.clone()), max_retries).unwrap();
    (storage, Arc::new(queue))
}
