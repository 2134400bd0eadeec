// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recall memory engine.

use thiserror::Error;

/// The primary error type used across all Recall crates.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input rejected before any side effect took place.
    #[error("validation error: {0}")]
    Validation(String),

    /// A requested entity (or the data an operation needs) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored embedding blob could not be decoded.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Storage backend errors (connection, query, transaction, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Hosted model errors (transport failure, non-2xx response, bad payload).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecallError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        RecallError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for errors raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, RecallError::Validation(_))
    }

    /// Returns true for not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecallError::NotFound(_))
    }
}

impl From<serde_json::Error> for RecallError {
    fn from(e: serde_json::Error) -> Self {
        RecallError::Internal(format!("json: {e}"))
    }
}
