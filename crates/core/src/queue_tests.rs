// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the mutation queue.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::clock::ManualClock;
use crate::mutation::VoteDirection;
use crate::storage::{MemoryStorage, SqliteStorage, CORRUPT_PREFIX};
use chrono::Duration;
use tempfile::TempDir;
use yare::parameterized;

fn open_queue(storage: &MemoryStorage, max_retries: u32) -> MutationQueue {
    MutationQueue::open(Arc::new(storage.clone()), max_retries).unwrap()
}

fn open_with_clock(storage: &MemoryStorage, clock: &Arc<ManualClock>) -> MutationQueue {
    MutationQueue::open_with_clock(Arc::new(storage.clone()), clock.clone(), 3).unwrap()
}

fn bookmark(post: &str) -> MutationPayload {
    MutationPayload::bookmark(post, true)
}

#[test]
fn enqueue_then_peek_returns_oldest() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 3);

    let a = queue.enqueue(bookmark("p1")).unwrap();
    let _b = queue.enqueue(MutationPayload::vote("p2", VoteDirection::Up)).unwrap();

    let next = queue.peek_next().unwrap();
    assert_eq!(next.id, a);
    assert_eq!(next.payload, bookmark("p1"));
    assert_eq!(queue.pending_count(), 2);
}

#[test]
fn peek_on_empty_queue_is_none() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    assert!(queue.peek_next().is_none());
    assert!(queue.is_empty());
}

#[test]
fn same_timestamp_orders_by_insertion() {
    let storage = MemoryStorage::new();
    let clock = Arc::new(ManualClock::at_millis(5_000));
    let queue = open_with_clock(&storage, &clock);

    let ids: Vec<_> = (0..5)
        .map(|i| queue.enqueue(bookmark(&format!("p{i}"))).unwrap())
        .collect();

    let order: Vec<_> = queue.list_pending().into_iter().map(|m| m.id).collect();
    assert_eq!(order, ids);
}

#[test]
fn clock_stepping_back_does_not_reorder() {
    let storage = MemoryStorage::new();
    let clock = Arc::new(ManualClock::at_millis(10_000));
    let queue = open_with_clock(&storage, &clock);

    let first = queue.enqueue(bookmark("p1")).unwrap();
    clock.advance(Duration::seconds(-60));
    let second = queue.enqueue(bookmark("p2")).unwrap();

    let order: Vec<_> = queue.list_pending().into_iter().map(|m| m.id).collect();
    assert_eq!(order, vec![first, second]);
}

#[test]
fn enqueued_mutations_survive_restart() {
    let storage = MemoryStorage::new();
    let ids: Vec<_> = {
        let queue = open_queue(&storage, 3);
        (0..4).map(|i| queue.enqueue(bookmark(&format!("p{i}"))).unwrap()).collect()
    };

    let reopened = open_queue(&storage, 3);
    assert_eq!(reopened.pending_count() + reopened.dead_letter_count(), 4);
    let order: Vec<_> = reopened.list_pending().into_iter().map(|m| m.id).collect();
    assert_eq!(order, ids);
}

#[test]
fn sqlite_backed_queue_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outbox.db");
    let id = {
        let storage = Arc::new(SqliteStorage::open(&path).unwrap());
        let queue = MutationQueue::open(storage, 3).unwrap();
        queue.enqueue(MutationPayload::comment("p1", "offline comment")).unwrap()
    };

    let storage = Arc::new(SqliteStorage::open(&path).unwrap());
    let queue = MutationQueue::open(storage, 3).unwrap();
    let next = queue.peek_next().unwrap();
    assert_eq!(next.id, id);
    assert_eq!(next.payload, MutationPayload::comment("p1", "offline comment"));
}

#[test]
fn sequence_continues_after_restart() {
    let storage = MemoryStorage::new();
    let clock = Arc::new(ManualClock::at_millis(1_000));
    let first = {
        let queue = open_with_clock(&storage, &clock);
        queue.enqueue(bookmark("p1")).unwrap()
    };

    let queue = open_with_clock(&storage, &clock);
    let second = queue.enqueue(bookmark("p2")).unwrap();
    let order: Vec<_> = queue.list_pending().into_iter().map(|m| (m.id, m.seq)).collect();
    assert_eq!(order, vec![(first, 0), (second, 1)]);
}

#[test]
fn only_one_mutation_in_flight() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    let a = queue.enqueue(bookmark("p1")).unwrap();
    let b = queue.enqueue(bookmark("p2")).unwrap();

    queue.mark_in_flight(&a).unwrap();
    assert_eq!(queue.in_flight(), Some(a));

    let err = queue.mark_in_flight(&b).unwrap_err();
    assert!(matches!(err, Error::AlreadyInFlight { .. }));

    // The in-flight item is not offered again
    assert_eq!(queue.peek_next().unwrap().id, b);
}

#[test]
fn mark_in_flight_twice_is_invalid_transition() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    let a = queue.enqueue(bookmark("p1")).unwrap();
    queue.mark_in_flight(&a).unwrap();

    let err = queue.mark_in_flight(&a).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[test]
fn mark_in_flight_unknown_id() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    let err = queue.mark_in_flight(&MutationId::new()).unwrap_err();
    assert!(matches!(err, Error::MutationNotFound(_)));
}

#[test]
fn ack_removes_durably_and_is_idempotent() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 3);
    let a = queue.enqueue(bookmark("p1")).unwrap();
    queue.mark_in_flight(&a).unwrap();

    assert!(queue.ack(&a).unwrap());
    assert!(!queue.ack(&a).unwrap());
    assert_eq!(queue.in_flight(), None);
    assert!(storage.get(&queue_key(&a)).unwrap().is_none());

    let reopened = open_queue(&storage, 3);
    assert!(reopened.is_empty());
}

#[test]
fn fail_returns_to_pending_with_error_recorded() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    let a = queue.enqueue(bookmark("p1")).unwrap();
    queue.mark_in_flight(&a).unwrap();

    let outcome = queue.fail(&a, "timeout").unwrap();
    assert_eq!(outcome, FailOutcome::Retry { attempts: 1 });

    let m = queue.peek_next().unwrap();
    assert_eq!(m.id, a);
    assert_eq!(m.status, MutationStatus::Pending);
    assert_eq!(m.attempts, 1);
    assert_eq!(m.last_error.as_deref(), Some("timeout"));
    assert_eq!(queue.in_flight(), None);
}

#[parameterized(
    no_retries = { 0, 1 },
    one_retry = { 1, 2 },
    three_retries = { 3, 4 },
)]
fn fail_dead_letters_once_attempts_exceed_budget(max_retries: u32, failures_to_dead: u32) {
    let queue = open_queue(&MemoryStorage::new(), max_retries);
    let a = queue.enqueue(bookmark("p1")).unwrap();

    let mut last = None;
    for _ in 0..failures_to_dead {
        queue.mark_in_flight(&a).unwrap();
        last = Some(queue.fail(&a, "503").unwrap());
    }

    assert_eq!(
        last,
        Some(FailOutcome::DeadLettered {
            attempts: failures_to_dead
        })
    );
    assert!(queue.peek_next().is_none());
    assert_eq!(queue.dead_letter_count(), 1);
    assert_eq!(queue.pending_count(), 0);
}

#[test]
fn dead_letter_is_terminal_and_retained() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 5);
    let a = queue.enqueue(MutationPayload::comment("p1", "")).unwrap();
    queue.mark_in_flight(&a).unwrap();

    queue.dead_letter(&a, "empty comment").unwrap();

    let dead = queue.list_dead_lettered();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].attempts, 1);
    assert_eq!(dead[0].last_error.as_deref(), Some("empty comment"));

    // Excluded from replay, survives restart
    assert!(queue.peek_next().is_none());
    let reopened = open_queue(&storage, 5);
    assert_eq!(reopened.list_dead_lettered()[0].id, a);

    // Cannot fail a dead letter again
    assert!(matches!(
        queue.fail(&a, "again").unwrap_err(),
        Error::InvalidTransition { .. }
    ));
}

#[test]
fn terminal_failure_does_not_block_later_mutations() {
    let queue = open_queue(&MemoryStorage::new(), 3);
    let a = queue.enqueue(bookmark("a")).unwrap();
    let b = queue.enqueue(bookmark("b")).unwrap();
    let c = queue.enqueue(bookmark("c")).unwrap();

    let mut delivered = Vec::new();
    while let Some(next) = queue.peek_next() {
        queue.mark_in_flight(&next.id).unwrap();
        delivered.push(next.id);
        if next.id == b {
            queue.dead_letter(&next.id, "rejected").unwrap();
        } else {
            queue.ack(&next.id).unwrap();
        }
    }

    assert_eq!(delivered, vec![a, b, c]);
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.list_dead_lettered().into_iter().map(|m| m.id).collect::<Vec<_>>(), vec![b]);
}

#[test]
fn cancel_only_affects_pending() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 0);
    let pending = queue.enqueue(bookmark("p1")).unwrap();
    let flying = queue.enqueue(bookmark("p2")).unwrap();
    let dead = queue.enqueue(bookmark("p3")).unwrap();

    queue.mark_in_flight(&dead).unwrap();
    queue.fail(&dead, "x").unwrap();
    queue.mark_in_flight(&flying).unwrap();

    assert!(!queue.cancel(&flying).unwrap());
    assert!(!queue.cancel(&dead).unwrap());
    assert!(!queue.cancel(&MutationId::new()).unwrap());

    assert!(queue.cancel(&pending).unwrap());
    assert!(queue.get(&pending).is_none());
    assert!(storage.get(&queue_key(&pending)).unwrap().is_none());

    // Acked ids are gone, so cancel reports false
    queue.ack(&flying).unwrap();
    assert!(!queue.cancel(&flying).unwrap());
}

#[test]
fn interrupted_delivery_is_recovered_as_pending() {
    let storage = MemoryStorage::new();
    let a = {
        let queue = open_queue(&storage, 3);
        let a = queue.enqueue(bookmark("p1")).unwrap();
        queue.mark_in_flight(&a).unwrap();
        a
    };

    let reopened = open_queue(&storage, 3);
    assert_eq!(reopened.in_flight(), None);
    let next = reopened.peek_next().unwrap();
    assert_eq!(next.id, a);
    assert_eq!(next.status, MutationStatus::Pending);
}

#[test]
fn corrupt_record_is_quarantined_on_open() {
    let storage = MemoryStorage::new();
    let good = {
        let queue = open_queue(&storage, 3);
        queue.enqueue(bookmark("p1")).unwrap()
    };
    storage.set("outbox:queue:garbage", b"{not json").unwrap();

    let queue = open_queue(&storage, 3);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.peek_next().unwrap().id, good);
    assert!(storage.get("outbox:queue:garbage").unwrap().is_none());
    assert!(storage
        .get(&format!("{CORRUPT_PREFIX}outbox:queue:garbage"))
        .unwrap()
        .is_some());
}

#[test]
fn newer_version_record_is_skipped_but_kept() {
    let storage = MemoryStorage::new();
    let mutation = PendingMutation::new(bookmark("p1"), DateTime::<Utc>::default(), 0);
    let bytes = record::encode(RecordKind::Mutation, &mutation).unwrap();
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    value["version"] = serde_json::json!(record::CURRENT_VERSION + 1);
    let key = queue_key(&mutation.id);
    storage.set(&key, &serde_json::to_vec(&value).unwrap()).unwrap();

    let queue = open_queue(&storage, 3);
    assert!(queue.is_empty());
    assert!(storage.get(&key).unwrap().is_some());
}

#[test]
fn failed_enqueue_leaves_queue_unchanged() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 3);
    storage.set_fail_writes(true);

    let err = queue.enqueue(bookmark("p1")).unwrap_err();
    assert!(err.is_storage_failure());
    assert!(queue.is_empty());
}

#[test]
fn failed_ack_releases_mutation_for_redelivery() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 3);
    let a = queue.enqueue(bookmark("p1")).unwrap();
    queue.mark_in_flight(&a).unwrap();

    storage.set_fail_writes(true);
    assert!(queue.ack(&a).is_err());
    storage.set_fail_writes(false);

    assert_eq!(queue.in_flight(), None);
    let next = queue.peek_next().unwrap();
    assert_eq!(next.id, a);
    assert_eq!(next.attempts, 0);
}

#[test]
fn requeue_restores_original_position() {
    let queue = open_queue(&MemoryStorage::new(), 0);
    let a = queue.enqueue(bookmark("a")).unwrap();
    let b = queue.enqueue(bookmark("b")).unwrap();
    queue.mark_in_flight(&a).unwrap();
    queue.fail(&a, "boom").unwrap();
    assert_eq!(queue.peek_next().unwrap().id, b);

    assert!(queue.requeue_dead_lettered(&a).unwrap());
    assert!(!queue.requeue_dead_lettered(&b).unwrap());

    let next = queue.peek_next().unwrap();
    assert_eq!(next.id, a);
    assert_eq!(next.attempts, 0);
    assert_eq!(queue.dead_letter_count(), 0);
}

#[test]
fn purge_removes_selected_or_all_dead_letters() {
    let storage = MemoryStorage::new();
    let queue = open_queue(&storage, 0);
    let ids: Vec<_> = (0..3).map(|i| queue.enqueue(bookmark(&format!("p{i}"))).unwrap()).collect();
    for id in &ids {
        queue.mark_in_flight(id).unwrap();
        queue.fail(id, "x").unwrap();
    }
    let live = queue.enqueue(bookmark("live")).unwrap();

    assert_eq!(queue.purge_dead_lettered(Some(&ids[0])).unwrap(), 1);
    assert_eq!(queue.purge_dead_lettered(Some(&live)).unwrap(), 0);
    assert_eq!(queue.purge_dead_lettered(None).unwrap(), 2);

    assert_eq!(queue.dead_letter_count(), 0);
    assert_eq!(queue.len(), 1);
    assert_eq!(open_queue(&storage, 0).len(), 1);
}
