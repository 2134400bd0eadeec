// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Recall multi-agent assistant.
//!
//! ## Architecture
//!
//! - **MemoryStore**: SQLite persistence with BLOB vectors and an FTS5
//!   shadow index, written transactionally
//! - **search**: keyword, vector and tag strategies with priority or
//!   weighted-hybrid result selection
//! - **MemoryRouter**: scope-aware façade agents call
//! - **reflection**: distills a thread's recent episodes into a global fact
//! - **Normalizer**: turns a personal statement into `{normalized, type, tags}`
//! - **LlmEpisodeSummarizer**: the model-backed summarizer used by reflection
//! - **HttpEmbedder**: OpenAI-compatible embedding adapter
//! - **embedding**: blob codec and cosine similarity

pub mod embedder;
pub mod embedding;
pub mod normalizer;
pub mod reflection;
pub mod router;
pub mod search;
pub mod store;
pub mod summarizer;
pub mod types;

#[cfg(test)]
mod testing;

pub use embedder::HttpEmbedder;
pub use normalizer::{
    NormalizedMemory, Normalizer, normalize_tag, sanitize_memory_type, sanitize_tags,
};
pub use reflection::{EpisodeSummarizer, reflect_thread};
pub use router::MemoryRouter;
pub use store::MemoryStore;
pub use summarizer::LlmEpisodeSummarizer;
pub use types::*;
