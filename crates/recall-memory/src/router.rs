// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scope-aware façade over [`MemoryStore`].
//!
//! Agents talk to the router rather than the store: each operation fixes
//! the scope, type and importance for its intent and forwards.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use recall_config::model::{MAX_REFLECTION_WINDOW_DAYS, MemoryConfig};
use recall_core::RecallError;
use tracing::debug;

use crate::normalizer::NormalizedMemory;
use crate::reflection::{EpisodeSummarizer, reflect_thread};
use crate::store::MemoryStore;
use crate::types::{
    Artifact, MemoryItem, MemoryType, Metadata, NewArtifact, NewMemory, PersonalMemory, Scope,
    SearchQuery, SearchResult,
};

pub const EPISODE_IMPORTANCE: f64 = 0.3;
pub const DOC_REF_IMPORTANCE: f64 = 0.5;
pub const AGENT_FACT_IMPORTANCE: f64 = 0.7;
pub const PERSONAL_IMPORTANCE: f64 = 0.8;
pub const GLOBAL_FACT_IMPORTANCE: f64 = 0.9;

pub struct MemoryRouter {
    store: Arc<MemoryStore>,
    reflection_window: Duration,
    reflect_min_interval: StdDuration,
}

impl MemoryRouter {
    pub fn new(store: Arc<MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            reflection_window: Duration::days(
                config
                    .reflection_window_days
                    .clamp(1, MAX_REFLECTION_WINDOW_DAYS),
            ),
            reflect_min_interval: StdDuration::from_secs(config.reflect_min_interval_secs),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Record an observation in one conversation thread.
    pub async fn add_episode(
        &self,
        agent_id: &str,
        thread_id: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<MemoryItem, RecallError> {
        self.store
            .remember(
                NewMemory::new(MemoryType::Episode, Scope::Agent, content)
                    .agent(agent_id)
                    .thread(thread_id)
                    .importance(EPISODE_IMPORTANCE)
                    .metadata(metadata),
            )
            .await
    }

    pub async fn add_agent_fact(
        &self,
        agent_id: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<MemoryItem, RecallError> {
        self.store
            .remember(
                NewMemory::new(MemoryType::Fact, Scope::Agent, content)
                    .agent(agent_id)
                    .importance(AGENT_FACT_IMPORTANCE)
                    .metadata(metadata),
            )
            .await
    }

    pub async fn add_global_fact(
        &self,
        content: &str,
        metadata: Metadata,
    ) -> Result<MemoryItem, RecallError> {
        self.store
            .remember(
                NewMemory::new(MemoryType::Fact, Scope::Global, content)
                    .importance(GLOBAL_FACT_IMPORTANCE)
                    .metadata(metadata),
            )
            .await
    }

    /// Record a pointer to an external document; global when `agent_id` is `None`.
    pub async fn add_doc_ref(
        &self,
        agent_id: Option<&str>,
        content: &str,
        metadata: Metadata,
    ) -> Result<MemoryItem, RecallError> {
        let memory = match agent_id {
            Some(agent) => NewMemory::new(MemoryType::DocRef, Scope::Agent, content).agent(agent),
            None => NewMemory::new(MemoryType::DocRef, Scope::Global, content),
        };
        self.store
            .remember(memory.importance(DOC_REF_IMPORTANCE).metadata(metadata))
            .await
    }

    /// Persist the normalizer's output for `raw_text`.
    pub async fn add_personal_memory(
        &self,
        agent_id: Option<&str>,
        raw_text: &str,
        normalized: &NormalizedMemory,
        thread_id: Option<&str>,
    ) -> Result<MemoryItem, RecallError> {
        self.store
            .store_personal_memory(PersonalMemory {
                agent_id: agent_id.map(str::to_string),
                thread_id: thread_id.map(str::to_string),
                raw_text: raw_text.to_string(),
                normalized_text: normalized.normalized.clone(),
                memory_type: normalized.memory_type.clone(),
                tags: normalized.tags.clone(),
                importance: PERSONAL_IMPORTANCE,
                metadata: Metadata::new(),
            })
            .await
    }

    /// Store a document; agent-scoped when `agent_id` is present.
    pub async fn add_artifact(
        &self,
        agent_id: Option<&str>,
        thread_id: Option<&str>,
        title: Option<&str>,
        body: &str,
        metadata: Metadata,
    ) -> Result<Artifact, RecallError> {
        let scope = if agent_id.is_some() {
            Scope::Agent
        } else {
            Scope::Global
        };
        self.store
            .create_artifact(NewArtifact {
                scope,
                agent_id: agent_id.map(str::to_string),
                thread_id: thread_id.map(str::to_string),
                title: title.map(str::to_string),
                body: body.to_string(),
                metadata,
            })
            .await
    }

    /// Hybrid search over one agent's memory, optionally with global memory.
    pub async fn query_agent_memory(
        &self,
        agent_id: &str,
        text: &str,
        limit: usize,
        include_global: bool,
    ) -> Result<Vec<SearchResult>, RecallError> {
        if agent_id.trim().is_empty() {
            return Err(RecallError::Validation("agent_id must not be empty".into()));
        }
        let query = self
            .hybrid_query(text)
            .await
            .for_agent(agent_id)
            .include_global(include_global)
            .limit(limit);
        self.store.search_memory(&query).await
    }

    /// Hybrid search over global memory only.
    pub async fn query_global_memory(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, RecallError> {
        let query = self.hybrid_query(text).await.include_global(true).limit(limit);
        self.store.search_memory(&query).await
    }

    /// Hybrid search over profile items.
    ///
    /// With an agent, that agent's profile items and global ones are
    /// searched; without, only global ones.
    pub async fn query_personal_memory(
        &self,
        agent_id: Option<&str>,
        text: &str,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>, RecallError> {
        let mut query = self
            .hybrid_query(text)
            .await
            .with_types([MemoryType::Profile])
            .with_tags(tags.iter().cloned())
            .include_global(true)
            .limit(limit);
        if let Some(agent) = agent_id {
            query = query.for_agent(agent);
        }
        self.store.search_memory(&query).await
    }

    /// Consolidate recent episodes of one thread into a global fact.
    pub async fn reflect(
        &self,
        agent_id: &str,
        thread_id: &str,
        summarizer: &dyn EpisodeSummarizer,
    ) -> Result<MemoryItem, RecallError> {
        reflect_thread(
            &self.store,
            agent_id,
            thread_id,
            summarizer,
            self.reflection_window,
        )
        .await
    }

    /// Reflect unless the last reflection was less than `min_interval` ago.
    /// `None` uses `memory.reflect_min_interval_secs`.
    ///
    /// `last_reflected` is owned by the caller and only advanced on success.
    /// The router adds no locking: callers sharing one timestamp across
    /// tasks must hold it behind their own mutex.
    pub async fn auto_reflect(
        &self,
        agent_id: &str,
        thread_id: &str,
        summarizer: &dyn EpisodeSummarizer,
        last_reflected: &mut Option<DateTime<Utc>>,
        min_interval: Option<StdDuration>,
    ) -> Result<Option<MemoryItem>, RecallError> {
        let min_interval = min_interval.unwrap_or(self.reflect_min_interval);
        let now = Utc::now();
        if let Some(last) = *last_reflected
            && let Ok(elapsed) = (now - last).to_std()
            && elapsed < min_interval
        {
            debug!(
                agent_id,
                thread_id,
                elapsed_secs = elapsed.as_secs(),
                "reflection skipped; interval not reached"
            );
            return Ok(None);
        }

        let fact = self.reflect(agent_id, thread_id, summarizer).await?;
        *last_reflected = Some(now);
        Ok(Some(fact))
    }

    /// Query text plus a best-effort embedding of it.
    async fn hybrid_query(&self, text: &str) -> SearchQuery {
        let mut query = SearchQuery::new(text).hybrid(true);
        if !text.trim().is_empty()
            && let Some(embedding) = self.store.embed_soft(text).await
        {
            query = query.with_embedding(embedding);
        }
        query
    }
}
