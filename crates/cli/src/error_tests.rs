// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    no_remote = { Error::NoRemote, "hint:" },
    drain_locked = { Error::DrainLocked, "already draining" },
    not_cancellable = { Error::NotCancellable("abc".into()), "outbox pending" },
    not_dead = { Error::NotDeadLettered("abc".into()), "outbox dead" },
    cache_miss = { Error::CacheMiss("feed".into()), "feed" },
)]
fn messages_guide_the_user(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn core_errors_pass_through_unchanged() {
    let core = outbox_core::Error::InvalidMutationId("zzz".into());
    let expected = core.to_string();
    assert_eq!(Error::from(core).to_string(), expected);
}
