// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use recall_config::model::StorageConfig;
use recall_core::RecallError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Map a tokio-rusqlite error onto [`RecallError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> RecallError {
    RecallError::Storage {
        source: Box::new(e),
    }
}

/// Map a connection-open failure onto [`RecallError::Storage`].
fn map_open_err(e: rusqlite::Error) -> RecallError {
    RecallError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database described by the storage config.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, RecallError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    /// Open (or create) a WAL-mode database file and apply migrations.
    pub async fn open(path: &str) -> Result<Self, RecallError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) a database file and apply migrations.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, RecallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| RecallError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).await.map_err(map_open_err)?;
        let db = Self { conn };
        db.configure(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database (tests, dry runs).
    pub async fn open_in_memory() -> Result<Self, RecallError> {
        let conn = Connection::open_in_memory().await.map_err(map_open_err)?;
        let db = Self { conn };
        db.configure(false).await?;
        Ok(db)
    }

    async fn configure(&self, wal_mode: bool) -> Result<(), RecallError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch(
                    "PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| RecallError::Storage {
                source: format!("migration failed: {e}").into(),
            })
    }

    /// The single shared connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), RecallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}
