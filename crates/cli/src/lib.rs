// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outboxrs - host application for the offline sync engine.
//!
//! This crate wires `outbox-core` and `outbox-sync` to a state directory on
//! disk and a WebSocket remote, and provides the `outbox` CLI.
//!
//! # Main Components
//!
//! - [`Config`] - `outbox.toml`: sync, cache and remote settings
//! - [`remote`] - WebSocket applier and TCP connectivity probe
//! - [`DrainLock`] - one drainer per state directory
//! - [`Error`] - error type for all CLI operations
//!
//! # State directory
//!
//! ```text
//! $OUTBOX_STATE_DIR/
//! ├── outbox.db     queue and cache records (SQLite)
//! ├── outbox.toml   optional configuration
//! ├── outbox.log    logs, with --log-file
//! └── drain.lock    held while `outbox sync` runs
//! ```

mod cli;
mod commands;
mod display;
mod env;
mod lock;
mod logging;

pub mod config;
pub mod error;
pub mod remote;

pub use cli::{CacheCommand, Cli, Command, EnqueueCommand, OutputFormat};
pub use config::{resolve_state_dir, Config, RemoteConfig};
pub use error::{Error, Result};
pub use lock::DrainLock;

/// Runs one parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = resolve_state_dir(cli.state_dir);
    logging::init(&state_dir, cli.log_file);

    match cli.command {
        Command::Enqueue(cmd) => commands::enqueue::run(&state_dir, cmd),
        Command::Pending { output } => commands::queue::pending(&state_dir, output),
        Command::Dead { output } => commands::queue::dead(&state_dir, output),
        Command::Cancel { id } => commands::queue::cancel(&state_dir, &id),
        Command::Requeue { id } => commands::queue::requeue(&state_dir, &id),
        Command::Purge { id } => commands::queue::purge(&state_dir, id.as_deref()),
        Command::Cache(cmd) => commands::cache::run(&state_dir, cmd),
        Command::Status { output } => commands::status::run(&state_dir, output),
        Command::Sync { url, watch, output } => {
            commands::sync::run(&state_dir, url, watch, output)
        }
        Command::Config => commands::config::run(&state_dir),
    }
}
