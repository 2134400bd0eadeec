// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consolidation of recent episodes into a durable global fact.
//!
//! Reflection is additive: episodes are read, never modified or deleted.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use recall_core::RecallError;
use serde_json::json;
use tracing::info;

use crate::store::MemoryStore;
use crate::types::{MemoryItem, MemoryType, Metadata, NewMemory, Scope};

/// Importance of facts produced by reflection.
pub const REFLECTION_IMPORTANCE: f64 = 0.7;

/// Distills a chronological batch of episodes into prose.
#[async_trait]
pub trait EpisodeSummarizer: Send + Sync {
    async fn summarize_episodes(&self, episodes: &[MemoryItem]) -> Result<String, RecallError>;
}

/// Summarize one agent/thread's episodes from the last `window` into a global fact.
///
/// Fails with `Validation` for blank ids and `NotFound` when the window
/// holds no episodes; summarizer errors are returned unchanged.
pub async fn reflect_thread(
    store: &MemoryStore,
    agent_id: &str,
    thread_id: &str,
    summarizer: &dyn EpisodeSummarizer,
    window: Duration,
) -> Result<MemoryItem, RecallError> {
    if agent_id.trim().is_empty() {
        return Err(RecallError::Validation("agent_id must not be empty".into()));
    }
    if thread_id.trim().is_empty() {
        return Err(RecallError::Validation("thread_id must not be empty".into()));
    }

    let since = Utc::now() - window;
    let episodes = store.recent_episodes(agent_id, thread_id, since).await?;
    if episodes.is_empty() {
        return Err(RecallError::NotFound(format!(
            "no episodes for agent '{agent_id}' thread '{thread_id}' in the last {} days",
            window.num_days()
        )));
    }

    let summary = summarizer.summarize_episodes(&episodes).await?;

    let mut metadata = Metadata::new();
    metadata.insert("thread_id".into(), json!(thread_id));
    metadata.insert("agent_id".into(), json!(agent_id));
    metadata.insert("source".into(), json!("reflection"));

    let fact = store
        .remember(
            NewMemory::new(MemoryType::Fact, Scope::Global, summary)
                .importance(REFLECTION_IMPORTANCE)
                .metadata(metadata),
        )
        .await?;

    info!(
        agent_id,
        thread_id,
        episodes = episodes.len(),
        fact_id = fact.id,
        "reflection stored"
    );
    Ok(fact)
}
