// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the memory engine.
//!
//! Both traits use `#[async_trait]` so they can be held as
//! `Arc<dyn Trait>` and swapped for mocks in tests.

pub mod embedding;
pub mod provider;

pub use embedding::EmbeddingAdapter;
pub use provider::ProviderAdapter;
