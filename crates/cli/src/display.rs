// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for command output.

use outbox_core::{CacheSizeInfo, MutationPayload, PendingMutation};
use outbox_sync::{DrainPhase, DrainReport, SyncState};

/// Longest body excerpt shown in one-line summaries.
const EXCERPT_CHARS: usize = 40;

/// One-line human summary of what a payload does.
pub fn describe_payload(payload: &MutationPayload) -> String {
    match payload {
        MutationPayload::Vote { post_id, direction } => format!("vote {direction} on {post_id}"),
        MutationPayload::Bookmark { post_id, saved: true } => format!("bookmark {post_id}"),
        MutationPayload::Bookmark { post_id, saved: false } => format!("unbookmark {post_id}"),
        MutationPayload::Comment {
            post_id,
            parent_id: None,
            body,
        } => format!("comment on {post_id}: \"{}\"", excerpt(body)),
        MutationPayload::Comment {
            post_id,
            parent_id: Some(parent),
            body,
        } => format!("reply to {parent} on {post_id}: \"{}\"", excerpt(body)),
        MutationPayload::CreatePost {
            community_id,
            title,
            ..
        } => format!("post \"{}\" in {community_id}", excerpt(title)),
        MutationPayload::JoinCommunity {
            community_id,
            joined: true,
        } => format!("join {community_id}"),
        MutationPayload::JoinCommunity {
            community_id,
            joined: false,
        } => format!("leave {community_id}"),
    }
}

/// Truncates on a char boundary, marking the cut with `...`.
pub fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// `<id>  <created>  <summary>` plus the attempt count once it has failed.
pub fn format_mutation_line(mutation: &PendingMutation) -> String {
    let mut line = format!(
        "{}  {}  {}",
        mutation.id,
        mutation.created_at.format("%Y-%m-%d %H:%M:%S"),
        describe_payload(&mutation.payload)
    );
    if mutation.attempts > 0 {
        line.push_str(&format!("  (attempts: {})", mutation.attempts));
    }
    line
}

/// Mutation line followed by an indented last error, if any.
pub fn format_mutation_block(mutation: &PendingMutation) -> String {
    let mut block = format_mutation_line(mutation);
    if let Some(err) = &mutation.last_error {
        block.push_str(&format!("\n    last error: {err}"));
    }
    block
}

/// Human readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn format_cache_info(info: &CacheSizeInfo) -> String {
    let noun = if info.entries == 1 { "entry" } else { "entries" };
    format!(
        "{} {noun}, {}",
        info.entries,
        format_bytes(info.payload_bytes)
    )
}

pub fn format_phase(phase: &DrainPhase) -> String {
    match phase {
        DrainPhase::Idle => "idle".to_string(),
        DrainPhase::Draining => "draining".to_string(),
        DrainPhase::Backoff { until } => {
            format!("backing off until {}", until.format("%Y-%m-%d %H:%M:%S UTC"))
        }
    }
}

/// Summary lines for a finished drain pass.
pub fn format_drain_report(report: &DrainReport) -> Vec<String> {
    let mut lines = vec![format!("Applied {} mutation(s)", report.applied)];
    if !report.dead_lettered.is_empty() {
        lines.push(format!(
            "Dead-lettered {} mutation(s):",
            report.dead_lettered.len()
        ));
        lines.extend(report.dead_lettered.iter().map(|id| format!("  {id}")));
    }
    if let Some(delay) = report.retry_scheduled {
        lines.push(format!(
            "Remote unavailable; next retry in {}",
            format_delay(delay)
        ));
    }
    lines
}

/// One status line per published sync state, as printed by `sync --watch`.
pub fn format_sync_state(state: &SyncState) -> String {
    let mut line = format!(
        "{}{}: {} pending, {} dead",
        if state.is_online { "online" } else { "offline" },
        if state.is_syncing { ", syncing" } else { "" },
        state.pending_count,
        state.dead_letter_count
    );
    if let Some(at) = state.last_sync_at {
        line.push_str(&format!(", last sync {}", at.format("%H:%M:%S")));
    }
    line
}

fn format_delay(delay: std::time::Duration) -> String {
    let secs = delay.as_secs();
    if secs == 0 {
        format!("{}ms", delay.as_millis())
    } else if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
