// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Self-describing persisted records.
//!
//! Every value the engine writes to storage is wrapped in an envelope:
//!
//! ```text
//! {"kind":"mutation","version":1,"checksum":"<sha256 hex>","body":"<json>"}
//! ```
//!
//! The body is kept as JSON text so the checksum covers exactly the bytes
//! that were written. Readers reject a record whose kind or checksum does not
//! match, and refuse (without treating it as corrupt) a record written by a
//! newer format version.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Highest record format version this build reads and the one it writes.
pub const CURRENT_VERSION: u32 = 1;

/// What a persisted record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Mutation,
    CacheEntry,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            RecordKind::Mutation => "mutation",
            RecordKind::CacheEntry => "cache_entry",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    kind: String,
    version: u32,
    checksum: String,
    body: String,
}

fn checksum(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// Serializes `value` into an envelope of the given kind.
pub fn encode<T: Serialize>(kind: RecordKind, value: &T) -> Result<Vec<u8>> {
    let body = serde_json::to_string(value)?;
    let envelope = Envelope {
        kind: kind.as_str().to_string(),
        version: CURRENT_VERSION,
        checksum: checksum(&body),
        body,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decodes a record read from `key`, expecting the given kind.
///
/// # Errors
///
/// [`Error::UnsupportedVersion`] if the record was written by a newer format,
/// [`Error::CorruptRecord`] for anything else that prevents decoding.
pub fn decode<T: DeserializeOwned>(key: &str, kind: RecordKind, bytes: &[u8]) -> Result<T> {
    let corrupt = |reason: String| Error::CorruptRecord {
        key: key.to_string(),
        reason,
    };

    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| corrupt(format!("bad envelope: {e}")))?;

    if envelope.version > CURRENT_VERSION {
        return Err(Error::UnsupportedVersion {
            key: key.to_string(),
            found: envelope.version,
            supported: CURRENT_VERSION,
        });
    }
    if envelope.kind != kind.as_str() {
        return Err(corrupt(format!(
            "expected {} record, found '{}'",
            kind.as_str(),
            envelope.kind
        )));
    }
    if envelope.checksum != checksum(&envelope.body) {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    serde_json::from_str(&envelope.body).map_err(|e| corrupt(format!("bad body: {e}")))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
