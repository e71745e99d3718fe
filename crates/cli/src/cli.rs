// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use outbox_core::VoteDirection;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn vote_direction(s: &str) -> Result<VoteDirection, String> {
    s.parse().map_err(|e: outbox_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// Only ids, one per line.
    #[value(alias = "ids")]
    Id,
}

#[derive(Parser)]
#[command(name = "outbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first mutation queue and read cache")]
#[command(
    long_about = "Offline-first mutation queue and read cache.\n\n\
    Queue writes while offline, keep a last-known-good cache of reads, and \
    replay queued writes in order against the remote once it is reachable."
)]
pub struct Cli {
    /// State directory holding outbox.db and outbox.toml
    #[arg(long, global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    /// Write logs to outbox.log in the state directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queue a mutation for delivery
    #[command(subcommand)]
    Enqueue(EnqueueCommand),

    /// List mutations waiting to be delivered
    Pending {
        /// Output format (text, json, id)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List dead-lettered mutations
    Dead {
        /// Output format (text, json, id)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Cancel a mutation that has not been sent
    Cancel {
        /// Mutation id
        id: String,
    },

    /// Put a dead-lettered mutation back in line
    Requeue {
        /// Mutation id
        id: String,
    },

    /// Delete dead-lettered mutations (all of them without an id)
    Purge {
        /// Mutation id
        id: Option<String>,
    },

    /// Read or modify the local read cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Show queue depth, dead letters and cache size
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Deliver pending mutations to the remote
    Sync {
        /// Remote url (overrides OUTBOX_REMOTE_URL and outbox.toml)
        #[arg(long)]
        url: Option<String>,

        /// Keep running: drain whenever the remote becomes reachable
        #[arg(long)]
        watch: bool,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum EnqueueCommand {
    /// Vote on a post
    Vote {
        post_id: String,
        /// up, down, or clear
        #[arg(value_parser = vote_direction)]
        direction: VoteDirection,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Save or unsave a post
    Bookmark {
        post_id: String,
        /// Remove the bookmark instead of adding it
        #[arg(long)]
        remove: bool,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Comment on a post
    Comment {
        post_id: String,
        body: String,
        /// Reply to this comment
        #[arg(long)]
        parent: Option<String>,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Create a post in a community
    Post {
        community_id: String,
        #[arg(value_parser = non_empty_string)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        link: Option<String>,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Join or leave a community
    Join {
        community_id: String,
        /// Leave instead of joining
        #[arg(long)]
        leave: bool,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Print a cached payload
    Get {
        #[arg(value_parser = non_empty_string)]
        key: String,
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Store a payload
    Set {
        #[arg(value_parser = non_empty_string)]
        key: String,
        value: String,
    },
    /// Remove one entry
    Rm {
        #[arg(value_parser = non_empty_string)]
        key: String,
    },
    /// Remove every cache entry
    Clear,
    /// Show entry count and payload size
    Info {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
