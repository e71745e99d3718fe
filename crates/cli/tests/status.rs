// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

mod common;
use common::*;

#[test]
fn status_counts_queue_and_cache() {
    let state = TempDir::new().unwrap();
    enqueue(&state, &["vote", "p1", "up"]);
    enqueue(&state, &["bookmark", "p2"]);
    outbox(&state)
        .args(["cache", "set", "k", "value"])
        .assert()
        .success();

    outbox(&state)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:  2"))
        .stdout(predicate::str::contains("Dead:     0"))
        .stdout(predicate::str::contains("Cache:    1 entry, 5 B"))
        .stdout(predicate::str::contains("Remote:   (not configured)"));
}

#[test]
fn status_json() {
    let state = TempDir::new().unwrap();
    enqueue(&state, &["vote", "p1", "up"]);

    let output = outbox(&state)
        .args(["status", "-o", "json"])
        .env("OUTBOX_REMOTE_URL", "ws://127.0.0.1:9")
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["queue_depth"], 1);
    assert_eq!(json["remote"], "ws://127.0.0.1:9");
    assert_eq!(json["dead_lettered"], serde_json::json!([]));
}

#[test]
fn config_prints_defaults() {
    let state = TempDir::new().unwrap();
    outbox(&state)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("# defaults"))
        .stdout(predicate::str::contains("max_retries = 5"))
        .stdout(predicate::str::contains("stale_after_secs = 300"));
}

#[test]
fn config_reflects_file() {
    let state = TempDir::new().unwrap();
    std::fs::write(
        state.path().join("outbox.toml"),
        "[sync]\nmax_retries = 2\n\n[remote]\nurl = \"ws://localhost:7171\"\n",
    )
    .unwrap();

    outbox(&state)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_retries = 2"))
        .stdout(predicate::str::contains("url = \"ws://localhost:7171\""));
}

#[test]
fn malformed_config_is_an_error() {
    let state = TempDir::new().unwrap();
    std::fs::write(state.path().join("outbox.toml"), "[sync\n").unwrap();

    outbox(&state)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn log_file_flag_writes_to_state_dir() {
    let state = TempDir::new().unwrap();
    outbox(&state)
        .args(["--log-file", "enqueue", "vote", "p1", "up"])
        .assert()
        .success();
    assert!(state.path().join("outbox.log").exists());
}
