// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Recall memory engine.
//!
//! Provides WAL-mode SQLite with embedded refinery migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The memory schema
//! (items, FTS5 shadow index, artifacts) lives in `migrations/`; the typed
//! queries over it live in `recall-memory`.

pub mod database;
pub mod migrations;

pub use database::{Database, map_tr_err};
