// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the CLI.

use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise logs go to `outbox.log` at `info`
/// when `to_file` is set, else to stderr at `warn` so command output stays
/// clean. Falls back to stderr if the log file cannot be opened.
pub fn init(state_dir: &Path, to_file: bool) {
    let default_level = if to_file { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if to_file {
        let log_path = crate::config::log_path(state_dir);
        let file = fs::create_dir_all(state_dir).and_then(|_| {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
        });
        if let Ok(file) = file {
            // Already installed when run() is called more than once in-process
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            return;
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
