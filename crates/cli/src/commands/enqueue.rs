// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use outbox_core::{MutationId, MutationPayload};

use crate::cli::{EnqueueCommand, OutputFormat};
use crate::display::describe_payload;
use crate::error::{Error, Result};

use super::Outbox;

pub fn run(state_dir: &Path, command: EnqueueCommand) -> Result<()> {
    let outbox = Outbox::open(state_dir)?;
    let (payload, output) = into_payload(command);
    run_impl(&outbox, payload, output).map(|_| ())
}

/// Internal implementation that accepts an open outbox for testing.
pub(crate) fn run_impl(
    outbox: &Outbox,
    payload: MutationPayload,
    output: OutputFormat,
) -> Result<MutationId> {
    let summary = describe_payload(&payload);
    let id = outbox.queue.enqueue(payload)?;

    match output {
        OutputFormat::Text => println!("Queued {summary} ({id})"),
        OutputFormat::Id => println!("{id}"),
        OutputFormat::Json => {
            let mutation = outbox
                .queue
                .get(&id)
                .ok_or_else(|| Error::Core(outbox_core::Error::MutationNotFound(id.to_string())))?;
            println!("{}", serde_json::to_string_pretty(&mutation)?);
        }
    }
    Ok(id)
}

/// Splits a parsed subcommand into the payload to queue and the output format.
pub(crate) fn into_payload(command: EnqueueCommand) -> (MutationPayload, OutputFormat) {
    match command {
        EnqueueCommand::Vote {
            post_id,
            direction,
            output,
        } => (MutationPayload::vote(post_id, direction), output),
        EnqueueCommand::Bookmark {
            post_id,
            remove,
            output,
        } => (MutationPayload::bookmark(post_id, !remove), output),
        EnqueueCommand::Comment {
            post_id,
            body,
            parent,
            output,
        } => {
            let payload = match parent {
                Some(parent) => MutationPayload::reply(post_id, parent, body),
                None => MutationPayload::comment(post_id, body),
            };
            (payload, output)
        }
        EnqueueCommand::Post {
            community_id,
            title,
            body,
            link,
            output,
        } => (
            MutationPayload::CreatePost {
                community_id,
                title,
                body,
                link,
            },
            output,
        ),
        EnqueueCommand::Join {
            community_id,
            leave,
            output,
        } => (MutationPayload::join_community(community_id, !leave), output),
    }
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
