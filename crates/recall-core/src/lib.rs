// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recall memory engine.
//!
//! This crate provides the error type shared by every Recall crate and the
//! two collaborator traits the memory engine consumes: embedding generation
//! and hosted text completion.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RecallError;
pub use traits::{EmbeddingAdapter, ProviderAdapter};
pub use types::{ProviderMessage, ProviderRequest, ProviderResponse, Role, TokenUsage};
