// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recall integration tests.
//!
//! Provides mock collaborators and a temp-database harness for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Deterministic bag-of-words embeddings, optional failure
//! - [`MockProvider`] - Completion provider with pre-configured responses
//! - [`MockSummarizer`] - Episode summarizer returning fixed text or an error
//! - [`TestHarness`] - Temp SQLite database wired to a store and router

pub mod harness;
pub mod mock_embedder;
pub mod mock_provider;
pub mod mock_summarizer;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
pub use mock_summarizer::MockSummarizer;
