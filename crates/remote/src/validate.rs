// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Content rules. A mutation that breaks one is rejected for good; sending
//! it again cannot succeed.

use outbox_core::MutationPayload;

pub const MAX_ID_CHARS: usize = 128;
pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_BODY_CHARS: usize = 40_000;
pub const MAX_LINK_CHARS: usize = 2_048;

/// Returns the rejection reason, if any.
pub fn check(payload: &MutationPayload) -> Result<(), String> {
    match payload {
        MutationPayload::Vote { post_id, .. } | MutationPayload::Bookmark { post_id, .. } => {
            check_id("post id", post_id)
        }
        MutationPayload::Comment {
            post_id,
            parent_id,
            body,
        } => {
            check_id("post id", post_id)?;
            if let Some(parent) = parent_id {
                check_id("parent id", parent)?;
            }
            check_text("comment body", body, MAX_BODY_CHARS)
        }
        MutationPayload::CreatePost {
            community_id,
            title,
            body,
            link,
        } => {
            check_id("community id", community_id)?;
            check_text("title", title, MAX_TITLE_CHARS)?;
            if body.chars().count() > MAX_BODY_CHARS {
                return Err(format!("body is longer than {MAX_BODY_CHARS} characters"));
            }
            if let Some(link) = link {
                check_link(link)?;
            }
            Ok(())
        }
        MutationPayload::JoinCommunity { community_id, .. } => {
            check_id("community id", community_id)
        }
    }
}

fn check_id(what: &str, id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err(format!("{what} is empty"));
    }
    if id.chars().count() > MAX_ID_CHARS {
        return Err(format!("{what} is longer than {MAX_ID_CHARS} characters"));
    }
    Ok(())
}

/// Required text: not blank, not over `max`.
fn check_text(what: &str, text: &str, max: usize) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("{what} is empty"));
    }
    if text.chars().count() > max {
        return Err(format!("{what} is longer than {max} characters"));
    }
    Ok(())
}

fn check_link(link: &str) -> Result<(), String> {
    if !(link.starts_with("http://") || link.starts_with("https://")) {
        return Err("link must be an http(s) url".to_string());
    }
    if link.len() > MAX_LINK_CHARS {
        return Err(format!("link is longer than {MAX_LINK_CHARS} bytes"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
