// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::time::Duration;

use elevq_core::ElevqError;
use tracing::debug;

use crate::migrations;

/// Busy timeout for writers from other processes sharing the file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database.
///
/// Cloning is cheap; every clone talks to the same writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run pending
    /// migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ElevqError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ElevqError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), ElevqError> {
            apply_pragmas(conn, wal_mode).map_err(|e| ElevqError::Storage {
                source: Box::new(e),
            })?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_call_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Filesystem path the database was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), ElevqError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(|e| ElevqError::Storage {
            source: Box::new(e),
        })
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> rusqlite::Result<()> {
    if wal_mode {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// Truncating WAL checkpoint. A no-op for rollback-journal databases.
pub(crate) async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), ElevqError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Map a tokio-rusqlite error around a plain rusqlite error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ElevqError {
    ElevqError::Storage {
        source: Box::new(e),
    }
}

/// Unwrap an [`ElevqError`] returned from inside a `call` closure, so domain
/// errors such as `Conflict` reach the caller unchanged.
pub(crate) fn flatten_call_err(e: tokio_rusqlite::Error<ElevqError>) -> ElevqError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => ElevqError::Storage {
            source: other.to_string().into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_runs_migrations_and_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elevq.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let (tables, journal, fks) = db
            .connection()
            .call(|conn| -> Result<(i64, String, i64), rusqlite::Error> {
                let tables = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('elevators', 'drivers', 'bookings', 'notifications')",
                    [],
                    |row| row.get(0),
                )?;
                let journal = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let fks = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
                Ok((tables, journal, fks))
            })
            .await
            .unwrap();

        assert_eq!(tables, 4);
        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(fks, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elevq.db");
        let path = path.to_str().unwrap();
        Database::open(path, true).await.unwrap().close().await.unwrap();
        let db = Database::open(path, true).await.unwrap();
        assert_eq!(db.path(), path);
    }
}
