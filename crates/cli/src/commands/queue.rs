// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inspecting and editing the mutation queue: `pending`, `dead`, `cancel`,
//! `requeue` and `purge`.

use std::path::Path;

use outbox_core::PendingMutation;

use crate::cli::OutputFormat;
use crate::display::format_mutation_block;
use crate::error::{Error, Result};

use super::{parse_id, Outbox};

pub fn pending(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    print_list(&outbox.queue.list_pending(), output, "No pending mutations")
}

pub fn dead(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    print_list(
        &outbox.queue.list_dead_lettered(),
        output,
        "No dead-lettered mutations",
    )
}

fn print_list(mutations: &[PendingMutation], output: OutputFormat, empty: &str) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(mutations)?),
        OutputFormat::Id => {
            for m in mutations {
                println!("{}", m.id);
            }
        }
        OutputFormat::Text if mutations.is_empty() => println!("{empty}"),
        OutputFormat::Text => {
            for m in mutations {
                println!("{}", format_mutation_block(m));
            }
        }
    }
    Ok(())
}

pub fn cancel(state_dir: &Path, id: &str) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    cancel_impl(&outbox, id)?;
    println!("Cancelled {id}");
    Ok(())
}

pub(crate) fn cancel_impl(outbox: &Outbox, id: &str) -> Result<()> {
    let parsed = parse_id(id)?;
    if outbox.queue.cancel(&parsed)? {
        return Ok(());
    }
    match outbox.queue.get(&parsed) {
        Some(_) => Err(Error::NotCancellable(id.to_string())),
        None => Err(outbox_core::Error::MutationNotFound(id.to_string()).into()),
    }
}

pub fn requeue(state_dir: &Path, id: &str) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    requeue_impl(&outbox, id)?;
    println!("Requeued {id}");
    Ok(())
}

pub(crate) fn requeue_impl(outbox: &Outbox, id: &str) -> Result<()> {
    let parsed = parse_id(id)?;
    if outbox.queue.requeue_dead_lettered(&parsed)? {
        Ok(())
    } else {
        Err(Error::NotDeadLettered(id.to_string()))
    }
}

pub fn purge(state_dir: &Path, id: Option<&str>) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    let removed = purge_impl(&outbox, id)?;
    println!("Purged {removed} dead-lettered mutation(s)");
    Ok(())
}

/// Without an id every dead letter goes; with one, it must be dead-lettered.
pub(crate) fn purge_impl(outbox: &Outbox, id: Option<&str>) -> Result<usize> {
    let Some(id) = id else {
        return Ok(outbox.queue.purge_dead_lettered(None)?);
    };
    let parsed = parse_id(id)?;
    match outbox.queue.purge_dead_lettered(Some(&parsed))? {
        0 => Err(Error::NotDeadLettered(id.to_string())),
        n => Ok(n),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
