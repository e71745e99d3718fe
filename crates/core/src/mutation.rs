// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending write intents.
//!
//! Every user write the host performs while possibly offline is captured as a
//! [`PendingMutation`]: a globally unique id, a closed [`MutationPayload`]
//! describing the write, and the bookkeeping the queue needs to replay it.
//! The id travels with the mutation to the remote so a retried delivery can
//! be recognized and applied at most once.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier for a mutation, assigned at enqueue time.
///
/// UUID v7, so ids sort roughly by creation time, but ordering decisions use
/// `created_at` and `seq`, never the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(Uuid);

impl MutationId {
    /// Generates a fresh id.
    pub fn new() -> Self {
        MutationId(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for MutationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(MutationId)
            .map_err(|_| Error::InvalidMutationId(s.to_string()))
    }
}

/// Direction of a vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
    /// Withdraw a previous vote.
    Clear,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
            VoteDirection::Clear => "clear",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            "clear" | "none" => Ok(VoteDirection::Clear),
            _ => Err(Error::InvalidVoteDirection(s.to_string())),
        }
    }
}

/// The write a mutation performs against the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationPayload {
    /// Vote on a post.
    Vote {
        post_id: String,
        direction: VoteDirection,
    },

    /// Save or unsave a post.
    Bookmark { post_id: String, saved: bool },

    /// Comment on a post, optionally replying to another comment.
    Comment {
        post_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        body: String,
    },

    /// Publish a new post in a community.
    CreatePost {
        community_id: String,
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },

    /// Join or leave a community.
    JoinCommunity { community_id: String, joined: bool },
}

impl MutationPayload {
    /// Creates a Vote payload.
    pub fn vote(post_id: impl Into<String>, direction: VoteDirection) -> Self {
        MutationPayload::Vote {
            post_id: post_id.into(),
            direction,
        }
    }

    /// Creates a Bookmark payload.
    pub fn bookmark(post_id: impl Into<String>, saved: bool) -> Self {
        MutationPayload::Bookmark {
            post_id: post_id.into(),
            saved,
        }
    }

    /// Creates a top-level Comment payload.
    pub fn comment(post_id: impl Into<String>, body: impl Into<String>) -> Self {
        MutationPayload::Comment {
            post_id: post_id.into(),
            parent_id: None,
            body: body.into(),
        }
    }

    /// Creates a Comment payload replying to `parent_id`.
    pub fn reply(
        post_id: impl Into<String>,
        parent_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        MutationPayload::Comment {
            post_id: post_id.into(),
            parent_id: Some(parent_id.into()),
            body: body.into(),
        }
    }

    /// Creates a CreatePost payload.
    pub fn create_post(
        community_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        MutationPayload::CreatePost {
            community_id: community_id.into(),
            title: title.into(),
            body: body.into(),
            link: None,
        }
    }

    /// Creates a JoinCommunity payload.
    pub fn join_community(community_id: impl Into<String>, joined: bool) -> Self {
        MutationPayload::JoinCommunity {
            community_id: community_id.into(),
            joined,
        }
    }

    /// Returns the discriminant of this payload.
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationPayload::Vote { .. } => MutationKind::Vote,
            MutationPayload::Bookmark { .. } => MutationKind::Bookmark,
            MutationPayload::Comment { .. } => MutationKind::Comment,
            MutationPayload::CreatePost { .. } => MutationKind::CreatePost,
            MutationPayload::JoinCommunity { .. } => MutationKind::JoinCommunity,
        }
    }

    /// Returns the id of the post or community this write targets.
    pub fn target_id(&self) -> &str {
        match self {
            MutationPayload::Vote { post_id, .. } => post_id,
            MutationPayload::Bookmark { post_id, .. } => post_id,
            MutationPayload::Comment { post_id, .. } => post_id,
            MutationPayload::CreatePost { community_id, .. } => community_id,
            MutationPayload::JoinCommunity { community_id, .. } => community_id,
        }
    }
}

/// The closed set of mutation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Vote,
    Bookmark,
    Comment,
    CreatePost,
    JoinCommunity,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Vote => "vote",
            MutationKind::Bookmark => "bookmark",
            MutationKind::Comment => "comment",
            MutationKind::CreatePost => "create_post",
            MutationKind::JoinCommunity => "join_community",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "vote" => Ok(MutationKind::Vote),
            "bookmark" => Ok(MutationKind::Bookmark),
            "comment" => Ok(MutationKind::Comment),
            "create_post" | "post" => Ok(MutationKind::CreatePost),
            "join_community" | "join" => Ok(MutationKind::JoinCommunity),
            _ => Err(Error::InvalidMutationKind(s.to_string())),
        }
    }
}

/// Where a mutation is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Waiting to be sent.
    Pending,
    /// Handed to the remote applier; outcome not yet known.
    InFlight,
    /// Confirmed applied. Acked records are deleted, so this is only ever
    /// observed transiently.
    Acked,
    /// Excluded from automatic replay; kept for inspection.
    DeadLettered,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Pending => "pending",
            MutationStatus::InFlight => "in_flight",
            MutationStatus::Acked => "acked",
            MutationStatus::DeadLettered => "dead_lettered",
        }
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MutationStatus::Pending),
            "in_flight" => Ok(MutationStatus::InFlight),
            "acked" => Ok(MutationStatus::Acked),
            "dead_lettered" | "dead" => Ok(MutationStatus::DeadLettered),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A durably queued write intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMutation {
    /// Idempotency key, carried to the remote on every delivery.
    pub id: MutationId,
    /// Insertion sequence within the queue; breaks `created_at` ties.
    pub seq: u64,
    /// The write itself.
    pub payload: MutationPayload,
    /// When the mutation was enqueued. Defines replay order.
    pub created_at: DateTime<Utc>,
    /// Failed delivery attempts so far.
    pub attempts: u32,
    /// Message from the most recent failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub status: MutationStatus,
}

impl PendingMutation {
    /// Creates a new pending mutation.
    pub fn new(payload: MutationPayload, created_at: DateTime<Utc>, seq: u64) -> Self {
        PendingMutation {
            id: MutationId::new(),
            seq,
            payload,
            created_at,
            attempts: 0,
            last_error: None,
            status: MutationStatus::Pending,
        }
    }

    /// Returns the mutation's kind.
    pub fn kind(&self) -> MutationKind {
        self.payload.kind()
    }

    /// Replay order key: creation time, then insertion sequence.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
