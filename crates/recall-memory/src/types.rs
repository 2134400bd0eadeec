// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types: items, artifacts, write requests and search queries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use recall_core::RecallError;
use serde::{Deserialize, Serialize};

use crate::normalizer::normalize_tag;

/// Opaque key/value bag attached to items and artifacts.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Who a memory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Private to one agent; `agent_id` is always present.
    Agent,
    /// Shared by every agent.
    Global,
}

impl Scope {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Agent => "agent",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Scope::Agent),
            "global" => Ok(Scope::Global),
            other => Err(RecallError::Validation(format!("unknown scope: {other}"))),
        }
    }
}

/// Coarse kind of a memory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Fact,
    Episode,
    Profile,
    DocRef,
}

impl MemoryType {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Fact => "fact",
            MemoryType::Episode => "episode",
            MemoryType::Profile => "profile",
            MemoryType::DocRef => "doc_ref",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fact" => Ok(MemoryType::Fact),
            "episode" => Ok(MemoryType::Episode),
            "profile" => Ok(MemoryType::Profile),
            "doc_ref" => Ok(MemoryType::DocRef),
            other => Err(RecallError::Validation(format!(
                "unknown memory type: {other}"
            ))),
        }
    }
}

/// A single persisted unit of memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Store-assigned, monotonic, never reused.
    pub id: i64,
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub scope: Scope,
    #[serde(rename = "type")]
    pub item_type: MemoryType,
    /// Canonical text; this is what is indexed and embedded.
    pub content: String,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    /// Always equal to `created_at`; items are never updated.
    pub updated_at: DateTime<Utc>,
    pub importance: f64,
    /// Profile items only: the statement as the user wrote it.
    pub raw_content: Option<String>,
    /// Profile items only: one of the normalizer's memory types.
    pub memory_type: Option<String>,
    /// Profile items only: sanitized tags, in order.
    pub tags: Vec<String>,
}

/// A durable document retrieved by id or scope listing only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub scope: Scope,
    pub title: Option<String>,
    pub body: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to [`MemoryStore::remember`](crate::MemoryStore::remember).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    pub item_type: MemoryType,
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub content: String,
    pub importance: f64,
    pub metadata: Metadata,
}

impl NewMemory {
    pub fn new(item_type: MemoryType, scope: Scope, content: impl Into<String>) -> Self {
        Self {
            item_type,
            scope,
            agent_id: None,
            thread_id: None,
            content: content.into(),
            importance: 0.0,
            metadata: Metadata::new(),
        }
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Input to [`MemoryStore::store_personal_memory`](crate::MemoryStore::store_personal_memory).
///
/// Stored as a `profile` item, agent-scoped when `agent_id` is present and
/// global otherwise. The normalized text is what gets indexed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonalMemory {
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub raw_text: String,
    pub normalized_text: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub importance: f64,
    pub metadata: Metadata,
}

/// Input to [`MemoryStore::create_artifact`](crate::MemoryStore::create_artifact).
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtifact {
    pub scope: Scope,
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub title: Option<String>,
    pub body: String,
    pub metadata: Metadata,
}

/// Parameters for [`MemoryStore::search_memory`](crate::MemoryStore::search_memory).
///
/// Agent selection:
///
/// | `agent_id` | `include_global` | rows considered |
/// |---|---|---|
/// | `Some(a)` | `false` | agent-scoped rows of `a` |
/// | `Some(a)` | `true` | agent-scoped rows of `a` and global rows |
/// | `None` | `true` | global rows |
/// | `None` | `false` | everything |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Free text for the keyword strategy.
    pub text: String,
    /// Query vector for the vector strategy.
    pub embedding: Option<Vec<f32>>,
    /// Item types to keep; empty keeps all.
    pub types: Vec<MemoryType>,
    pub memory_type: Option<String>,
    /// Tags for the tag strategy.
    pub tags: Vec<String>,
    pub min_importance: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub agent_id: Option<String>,
    pub include_global: bool,
    /// Result cap; 0 means the configured default.
    pub limit: usize,
    /// Weighted fusion of all strategies instead of first-non-empty.
    pub hybrid: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = MemoryType>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    pub fn with_memory_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = Some(memory_type.into());
        self
    }

    /// Tags are normalized the way stored tags are; ones that normalize to
    /// nothing are dropped.
    pub fn with_tags<S: AsRef<str>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags
            .into_iter()
            .map(|t| normalize_tag(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn with_min_importance(mut self, min: f64) -> Self {
        self.min_importance = Some(min);
        self
    }

    pub fn with_time_range(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn for_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn include_global(mut self, include: bool) -> Self {
        self.include_global = include;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn hybrid(mut self, hybrid: bool) -> Self {
        self.hybrid = hybrid;
        self
    }

    /// The result cap, substituting `default` for 0.
    pub fn effective_limit(&self, default: usize) -> usize {
        if self.limit == 0 { default } else { self.limit }
    }
}

/// A search hit. Scores are only comparable within one search call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub item: MemoryItem,
    pub score: f64,
}
