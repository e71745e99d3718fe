// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use outbox_core::{MutationId, VoteDirection};
use yare::parameterized;

use super::*;

fn mutation(payload: MutationPayload) -> PendingMutation {
    PendingMutation::new(
        payload,
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        0,
    )
}

#[parameterized(
    vote = { MutationPayload::vote("p1", VoteDirection::Down), "vote down on p1" },
    bookmark = { MutationPayload::bookmark("p1", true), "bookmark p1" },
    unbookmark = { MutationPayload::bookmark("p1", false), "unbookmark p1" },
    comment = { MutationPayload::comment("p1", "nice"), "comment on p1: \"nice\"" },
    reply = { MutationPayload::reply("p1", "c9", "agreed"), "reply to c9 on p1: \"agreed\"" },
    post = { MutationPayload::create_post("rust", "Hello", ""), "post \"Hello\" in rust" },
    join = { MutationPayload::join_community("rust", true), "join rust" },
    leave = { MutationPayload::join_community("rust", false), "leave rust" },
)]
fn describes_payloads(payload: MutationPayload, expected: &str) {
    assert_eq!(describe_payload(&payload), expected);
}

#[test]
fn excerpt_truncates_long_text_on_char_boundary() {
    let long = "é".repeat(60);
    let short = excerpt(&long);
    assert!(short.ends_with("..."));
    assert_eq!(short.chars().count(), 43);

    assert_eq!(excerpt("  short  "), "short");
}

#[test]
fn mutation_line_shows_attempts_only_after_failures() {
    let mut m = mutation(MutationPayload::bookmark("p1", true));
    let line = format_mutation_line(&m);
    assert!(line.starts_with(&m.id.to_string()));
    assert!(line.contains("2026-03-01 09:30:00"));
    assert!(!line.contains("attempts"));

    m.attempts = 2;
    assert!(format_mutation_line(&m).ends_with("(attempts: 2)"));
}

#[test]
fn mutation_block_includes_last_error() {
    let mut m = mutation(MutationPayload::comment("p1", ""));
    m.attempts = 1;
    m.last_error = Some("comment body is empty".to_string());

    let block = format_mutation_block(&m);
    let lines: Vec<_> = block.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "    last error: comment body is empty");
}

#[parameterized(
    zero = { 0, "0 B" },
    bytes = { 1023, "1023 B" },
    kib = { 1536, "1.5 KiB" },
    mib = { 5 * 1024 * 1024, "5.0 MiB" },
)]
fn formats_bytes(bytes: u64, expected: &str) {
    assert_eq!(format_bytes(bytes), expected);
}

#[test]
fn cache_info_pluralizes() {
    let one = CacheSizeInfo {
        entries: 1,
        payload_bytes: 10,
    };
    assert_eq!(format_cache_info(&one), "1 entry, 10 B");

    let many = CacheSizeInfo {
        entries: 3,
        payload_bytes: 2048,
    };
    assert_eq!(format_cache_info(&many), "3 entries, 2.0 KiB");
}

#[test]
fn phase_text() {
    assert_eq!(format_phase(&DrainPhase::Idle), "idle");
    let until = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap();
    assert_eq!(
        format_phase(&DrainPhase::Backoff { until }),
        "backing off until 2026-03-01 09:30:05 UTC"
    );
}

#[test]
fn drain_report_lines() {
    let dead = MutationId::new();
    let report = DrainReport {
        applied: 2,
        dead_lettered: vec![dead],
        retry_scheduled: Some(Duration::from_secs(90)),
        order: Vec::new(),
    };

    let lines = format_drain_report(&report);
    assert_eq!(
        lines,
        vec![
            "Applied 2 mutation(s)".to_string(),
            "Dead-lettered 1 mutation(s):".to_string(),
            format!("  {dead}"),
            "Remote unavailable; next retry in 1m30s".to_string(),
        ]
    );
}

#[test]
fn short_retry_delay_in_millis() {
    let report = DrainReport {
        retry_scheduled: Some(Duration::from_millis(500)),
        ..DrainReport::default()
    };
    assert_eq!(
        format_drain_report(&report).last().unwrap(),
        "Remote unavailable; next retry in 500ms"
    );
}

#[test]
fn sync_state_line() {
    let mut state = SyncState {
        is_online: false,
        pending_count: 3,
        ..SyncState::default()
    };
    assert_eq!(format_sync_state(&state), "offline: 3 pending, 0 dead");

    state.is_online = true;
    state.is_syncing = true;
    state.last_sync_at = Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap());
    assert_eq!(
        format_sync_state(&state),
        "online, syncing: 3 pending, 0 dead, last sync 09:30:05"
    );
}
