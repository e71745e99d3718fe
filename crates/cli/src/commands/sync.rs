// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `outbox sync`: replay queued mutations against the remote.
//!
//! One-shot mode probes the remote once and runs a single drain pass.
//! `--watch` keeps a connectivity poller and the coordinator loop running
//! until interrupted, draining every time the remote becomes reachable.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use outbox_sync::{
    ConnectivitySource, NetworkMonitor, NetworkState, RemoteApplier, SyncCoordinator,
    TriggerOutcome,
};
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::display::{format_drain_report, format_sync_state};
use crate::error::Result;
use crate::lock::DrainLock;
use crate::remote::{TcpProbe, WebSocketApplier};

use super::Outbox;

pub fn run(state_dir: &Path, url: Option<String>, watch: bool, output: OutputFormat) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    let url = outbox.config.resolve_remote_url(url)?;
    let probe = TcpProbe::from_url(
        &url,
        Duration::from_millis(outbox.config.probe_timeout_ms()),
    )?;
    let _lock = DrainLock::acquire(&outbox.state_dir)?;
    let applier: Arc<dyn RemoteApplier> = Arc::new(WebSocketApplier::new(url.as_str()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tracing::info!(%url, watch, pending = outbox.queue.pending_count(), "sync starting");
    runtime.block_on(async {
        if watch {
            watch_impl(&outbox, applier, Arc::new(probe)).await;
            return Ok(());
        }
        let outcome = drain_once(&outbox, applier, &probe).await?;
        print_outcome(&outbox, &outcome, output)
    })
}

fn coordinator(
    outbox: &Outbox,
    applier: Arc<dyn RemoteApplier>,
    initial: NetworkState,
) -> (Arc<NetworkMonitor>, SyncCoordinator) {
    let monitor = Arc::new(NetworkMonitor::new(
        initial,
        outbox.config.sync.subscriber_buffer,
    ));
    let coordinator = SyncCoordinator::new(
        Arc::clone(&outbox.queue),
        Arc::clone(&monitor),
        applier,
        &outbox.config.sync,
    )
    .with_cache(Arc::clone(&outbox.cache));
    (monitor, coordinator)
}

/// Probes once, then runs one drain pass if the remote is reachable.
pub(crate) async fn drain_once(
    outbox: &Outbox,
    applier: Arc<dyn RemoteApplier>,
    source: &dyn ConnectivitySource,
) -> Result<TriggerOutcome> {
    let initial = NetworkState::from(source.probe().await);
    let (_monitor, coordinator) = coordinator(outbox, applier, initial);
    Ok(coordinator.sync_now().await?)
}

async fn watch_impl(
    outbox: &Outbox,
    applier: Arc<dyn RemoteApplier>,
    source: Arc<dyn ConnectivitySource>,
) {
    let (monitor, coordinator) = coordinator(outbox, applier, NetworkState::Offline);
    let cancel = CancellationToken::new();

    let poller = monitor.spawn_poller(source, outbox.config.sync.probe_interval(), cancel.clone());

    let mut states = coordinator.watch();
    let printer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = states.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = states.borrow_and_update().clone();
                        println!("{}", format_sync_state(&state));
                    }
                }
            }
        }
    });

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, stopping sync");
                cancel.cancel();
            }
        }
    });

    coordinator.run(cancel.clone()).await;
    cancel.cancel();
    let _ = poller.await;
    let _ = printer.await;
}

fn print_outcome(outbox: &Outbox, outcome: &TriggerOutcome, output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match outcome {
        TriggerOutcome::Drained(report) => {
            for line in format_drain_report(report) {
                println!("{line}");
            }
        }
        TriggerOutcome::AlreadyRunning => println!("A drain is already running"),
        TriggerOutcome::Offline => println!("Remote unreachable"),
    }
    let pending = outbox.queue.pending_count();
    if pending > 0 {
        println!("{pending} mutation(s) still pending");
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
