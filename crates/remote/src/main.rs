// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox-remote: reference remote authority for outbox clients.
//!
//! Applies each delivered mutation at most once, keyed by mutation id, and
//! answers with a verdict the client maps to ack, retry or dead-letter.

mod server;
mod state;
mod validate;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// outbox-remote: idempotent mutation sink
#[derive(Parser, Debug)]
#[command(name = "outbox-remote")]
#[command(about = "Reference remote that applies outbox mutations idempotently")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:7171")]
    bind: SocketAddr,

    /// Directory for the applied-mutation database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Answer every apply with "unavailable" (clients keep and retry)
    #[arg(long)]
    maintenance: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting outbox-remote");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());
    if args.maintenance {
        info!("  Maintenance mode: every apply is refused as unavailable");
    }

    std::fs::create_dir_all(&args.data)?;
    let state = state::ServerState::open(&args.data)?;
    state.set_maintenance(args.maintenance);
    info!("  Applied so far: {}", state.applied_count().await?);

    server::run(args.bind, state).await?;

    Ok(())
}
