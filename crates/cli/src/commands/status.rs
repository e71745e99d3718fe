// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use outbox_core::{CacheSizeInfo, MutationId, PendingMutation};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::{format_cache_info, format_mutation_block};
use crate::error::Result;

use super::Outbox;

/// What `outbox status` reports.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    pub state_dir: PathBuf,
    pub remote: Option<String>,
    pub queue_depth: usize,
    /// Left `InFlight` by a drain that did not finish; redelivered next sync.
    pub in_flight: Option<MutationId>,
    pub dead_lettered: Vec<PendingMutation>,
    pub cache: CacheSizeInfo,
}

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    let report = collect(&outbox)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text | OutputFormat::Id => {
            for line in render(&report) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn collect(outbox: &Outbox) -> Result<StatusReport> {
    Ok(StatusReport {
        state_dir: outbox.state_dir.clone(),
        remote: outbox.config.resolve_remote_url(None).ok(),
        queue_depth: outbox.queue.pending_count(),
        in_flight: outbox.queue.in_flight(),
        dead_lettered: outbox.queue.list_dead_lettered(),
        cache: outbox.cache.size_info()?,
    })
}

pub(crate) fn render(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("State:    {}", report.state_dir.display()),
        format!(
            "Remote:   {}",
            report.remote.as_deref().unwrap_or("(not configured)")
        ),
        format!("Pending:  {}", report.queue_depth),
        format!("Dead:     {}", report.dead_lettered.len()),
        format!("Cache:    {}", format_cache_info(&report.cache)),
    ];
    if !report.dead_lettered.is_empty() {
        lines.push(String::new());
        lines.push("Dead-lettered:".to_string());
        lines.extend(
            report
                .dead_lettered
                .iter()
                .map(|m| format!("  {}", format_mutation_block(m))),
        );
    }
    lines
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
