// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::RecallError;

/// Adapter for turning text into a dense vector.
///
/// The engine holds this as `Option<Arc<dyn EmbeddingAdapter>>`: `None`
/// disables every embedding-dependent ranking strategy. A failed call is
/// never fatal for a write; the item is stored without a vector.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecallError>;
}
