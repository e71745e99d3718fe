// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the applied-mutation database for shared access across connections.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use outbox_core::protocol::ServerMessage;
use outbox_core::{MutationId, PendingMutation};

use crate::validate;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS applied (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    target TEXT NOT NULL,
    payload TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
";

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    db: Mutex<Connection>,
    maintenance: AtomicBool,
}

impl ServerState {
    /// Opens (creating if needed) `applied.db` in the given directory.
    pub fn open(data_dir: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(data_dir.join("applied.db"))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(ServerState {
            inner: Arc::new(ServerStateInner {
                db: Mutex::new(conn),
                maintenance: AtomicBool::new(false),
            }),
        })
    }

    /// While set, every apply is answered `Unavailable`.
    pub fn set_maintenance(&self, on: bool) {
        self.inner.maintenance.store(on, Ordering::Relaxed);
    }

    /// Applies a mutation at most once and returns the verdict.
    ///
    /// An id seen before answers `Duplicate` without re-validating, so a
    /// client whose ack was lost gets the same outcome it would have had.
    pub async fn apply(&self, mutation: &PendingMutation) -> ServerMessage {
        let id = mutation.id;
        if self.inner.maintenance.load(Ordering::Relaxed) {
            return ServerMessage::unavailable(id, "server is in maintenance");
        }

        let db = self.inner.db.lock().await;
        match Self::record(&db, mutation) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(%id, error = %e, "failed to record mutation");
                ServerMessage::unavailable(id, "storage error")
            }
        }
    }

    fn record(db: &Connection, mutation: &PendingMutation) -> rusqlite::Result<ServerMessage> {
        let id = mutation.id;
        let key = id.to_string();

        let seen: Option<String> = db
            .query_row("SELECT id FROM applied WHERE id = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        if seen.is_some() {
            tracing::debug!(%id, "duplicate delivery");
            return Ok(ServerMessage::duplicate(id));
        }

        if let Err(reason) = validate::check(&mutation.payload) {
            tracing::info!(%id, %reason, "rejected mutation");
            return Ok(ServerMessage::rejected(id, reason));
        }

        let payload = serde_json::to_string(&mutation.payload)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        db.execute(
            "INSERT INTO applied (id, kind, target, payload, applied_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key,
                mutation.kind().as_str(),
                mutation.payload.target_id(),
                payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tracing::debug!(%id, kind = %mutation.kind(), "applied mutation");
        Ok(ServerMessage::applied(id))
    }

    /// Returns true if this id has been applied.
    #[cfg(test)]
    pub async fn is_applied(&self, id: &MutationId) -> rusqlite::Result<bool> {
        let db = self.inner.db.lock().await;
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM applied WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of mutations applied so far.
    pub async fn applied_count(&self) -> rusqlite::Result<u64> {
        let db = self.inner.db.lock().await;
        db.query_row("SELECT COUNT(*) FROM applied", [], |row| row.get(0))
    }

    /// Applied mutation ids in the order they were applied.
    #[cfg(test)]
    pub async fn applied_ids(&self) -> rusqlite::Result<Vec<MutationId>> {
        let db = self.inner.db.lock().await;
        let mut stmt = db.prepare("SELECT id FROM applied ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|s| s.parse().ok())
            .collect();
        Ok(ids)
    }
}
