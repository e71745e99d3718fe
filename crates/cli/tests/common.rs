// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `outbox` pointed at `state`, isolated from the caller's environment.
pub fn outbox(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("outbox");
    cmd.arg("--state-dir")
        .arg(state.path())
        .env_remove("OUTBOX_STATE_DIR")
        .env_remove("OUTBOX_REMOTE_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs `outbox <args> -o id` and returns the printed id.
pub fn enqueue(state: &TempDir, args: &[&str]) -> String {
    let output = outbox(state)
        .arg("enqueue")
        .args(args)
        .args(["-o", "id"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "enqueue failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Ids printed one per line by `-o id`.
pub fn ids(state: &TempDir, command: &str) -> Vec<String> {
    let output = outbox(state)
        .args([command, "-o", "id"])
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// A loopback url nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("ws://127.0.0.1:{port}")
}
