// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::pin::Pin;

use outbox_core::{MutationStatus, ServerMessage};

use super::*;
use crate::commands::testing::{enqueue_vote, outbox};
use crate::remote::transport_tests::{MockTransport, Reply};

struct Fixed(bool);

impl ConnectivitySource for Fixed {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let online = self.0;
        Box::pin(async move { online })
    }
}

fn applier(mock: &MockTransport) -> Arc<dyn RemoteApplier> {
    Arc::new(WebSocketApplier::with_transport("ws://remote.test", mock.clone()))
}

#[tokio::test]
async fn offline_probe_leaves_queue_untouched() {
    let (_dir, outbox) = outbox();
    enqueue_vote(&outbox, "p1");
    let mock = MockTransport::new();

    let outcome = drain_once(&outbox, applier(&mock), &Fixed(false))
        .await
        .unwrap();

    assert_eq!(outcome, TriggerOutcome::Offline);
    assert!(mock.sent().is_empty());
    assert_eq!(outbox.queue.pending_count(), 1);
}

#[tokio::test]
async fn drains_in_order_and_dead_letters_rejections() {
    let (_dir, outbox) = outbox();
    let a = enqueue_vote(&outbox, "p1");
    let b = enqueue_vote(&outbox, "p2");
    let c = enqueue_vote(&outbox, "p3");

    let mock = MockTransport::new();
    mock.reply(Reply::Message(ServerMessage::applied(a)));
    mock.reply(Reply::Message(ServerMessage::rejected(b, "post deleted")));
    mock.reply(Reply::Message(ServerMessage::duplicate(c)));

    let outcome = drain_once(&outbox, applier(&mock), &Fixed(true))
        .await
        .unwrap();

    let TriggerOutcome::Drained(report) = outcome else {
        unreachable!("expected a drain, got {outcome:?}");
    };
    assert_eq!(report.order, vec![a, b, c]);
    assert_eq!(report.applied, 2);
    assert_eq!(report.dead_lettered, vec![b]);
    assert_eq!(outbox.queue.pending_count(), 0);
    assert_eq!(
        outbox.queue.get(&b).unwrap().status,
        MutationStatus::DeadLettered
    );
}

#[tokio::test]
async fn unavailable_remote_keeps_mutation_for_retry() {
    let (_dir, outbox) = outbox();
    let a = enqueue_vote(&outbox, "p1");
    let b = enqueue_vote(&outbox, "p2");

    let mock = MockTransport::new();
    mock.reply(Reply::Message(ServerMessage::unavailable(a, "maintenance")));

    let outcome = drain_once(&outbox, applier(&mock), &Fixed(true))
        .await
        .unwrap();

    let TriggerOutcome::Drained(report) = outcome else {
        unreachable!("expected a drain, got {outcome:?}");
    };
    assert_eq!(report.applied, 0);
    assert!(report.retry_scheduled.is_some());
    assert_eq!(report.order, vec![a]);

    let head = outbox.queue.peek_next().unwrap();
    assert_eq!(head.id, a);
    assert_eq!(head.attempts, 1);
    assert!(outbox.queue.get(&b).is_some());
}
