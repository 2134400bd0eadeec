// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage and an FTS5 shadow index.
//!
//! Every memory row is paired with exactly one `memory_fts` row carrying the
//! same id. Both are written inside one transaction, so a failed write
//! leaves neither behind. Embeddings are computed before the transaction
//! opens and a failed embedding call degrades the write to "no vector".

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use metrics::counter;
use recall_config::model::MemoryConfig;
use recall_core::{EmbeddingAdapter, RecallError};
use recall_storage::{Database, map_tr_err};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::embedding::{decode, encode};
use crate::search::{
    fts_query, keyword_results, merge_hybrid, select_non_hybrid, tag_results, vector_results,
};
use crate::types::{
    Artifact, MemoryItem, MemoryType, Metadata, NewArtifact, NewMemory, PersonalMemory, Scope,
    SearchQuery, SearchResult,
};

const ITEM_COLUMNS: &str = "m.id, m.agent_id, m.thread_id, m.scope, m.type, m.content, \
    m.embedding, m.metadata, m.created_at, m.updated_at, m.importance, m.raw_content, \
    m.memory_type, m.tags_json";

const ARTIFACT_COLUMNS: &str =
    "a.id, a.agent_id, a.thread_id, a.scope, a.title, a.body, a.metadata, a.created_at, a.updated_at";

/// Persistent store for memory items and artifacts.
pub struct MemoryStore {
    conn: Connection,
    embedder: Option<Arc<dyn EmbeddingAdapter>>,
    candidate_window: usize,
    keyword_multiplier: usize,
    default_limit: usize,
}

impl MemoryStore {
    /// Creates a store over an already-migrated database.
    ///
    /// `embedder = None` disables embedding on write; vector search then
    /// only sees rows embedded earlier.
    pub fn new(
        db: &Database,
        embedder: Option<Arc<dyn EmbeddingAdapter>>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            conn: db.connection().clone(),
            embedder,
            candidate_window: config.candidate_window.max(1),
            keyword_multiplier: config.keyword_candidate_multiplier.max(1),
            default_limit: config.default_search_limit.max(1),
        }
    }

    /// Whether an embedding adapter is configured.
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Embeds `text`, absorbing failures.
    ///
    /// Returns `None` when no embedder is configured, when the call fails
    /// (logged and counted), or when the adapter returns an empty vector.
    pub async fn embed_soft(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(text).await {
            Ok(vector) if !vector.is_empty() => Some(vector),
            Ok(_) => {
                warn!("embedder returned an empty vector; continuing without one");
                None
            }
            Err(e) => {
                counter!("recall_embedding_failures_total").increment(1);
                warn!(error = %e, "embedding failed; continuing without a vector");
                None
            }
        }
    }

    /// Persist a new memory item and its full-text index entry atomically.
    pub async fn remember(&self, memory: NewMemory) -> Result<MemoryItem, RecallError> {
        if memory.content.trim().is_empty() {
            return Err(RecallError::Validation("content must not be empty".into()));
        }
        validate_attribution(
            memory.scope,
            memory.agent_id.as_deref(),
            memory.thread_id.as_deref(),
        )?;

        let embedding = self.embed_soft(&memory.content).await;
        let now = Utc::now().trunc_subsecs(3);

        let row = InsertItem {
            agent_id: memory.agent_id,
            thread_id: memory.thread_id,
            scope: memory.scope,
            item_type: memory.item_type,
            content: memory.content,
            embedding,
            metadata: memory.metadata,
            created_at: now,
            importance: memory.importance,
            raw_content: None,
            memory_type: None,
            tags: Vec::new(),
        };
        let item = self.insert_indexed(row).await?;

        counter!("recall_memory_writes_total", "kind" => "remember").increment(1);
        debug!(
            id = item.id,
            scope = %item.scope,
            item_type = %item.item_type,
            embedded = item.embedding.is_some(),
            "memory item stored"
        );
        Ok(item)
    }

    /// Persist a normalized personal statement as a `profile` item.
    ///
    /// The normalized text is what gets indexed and embedded; a blank
    /// normalized text falls back to the raw text.
    pub async fn store_personal_memory(
        &self,
        memory: PersonalMemory,
    ) -> Result<MemoryItem, RecallError> {
        let raw = memory.raw_text.trim();
        let normalized = memory.normalized_text.trim();
        let content = if !normalized.is_empty() {
            normalized.to_string()
        } else if !raw.is_empty() {
            raw.to_string()
        } else {
            return Err(RecallError::Validation(
                "personal memory needs raw or normalized text".into(),
            ));
        };

        let scope = if memory.agent_id.is_some() {
            Scope::Agent
        } else {
            Scope::Global
        };
        validate_attribution(scope, memory.agent_id.as_deref(), memory.thread_id.as_deref())?;

        let embedding = self.embed_soft(&content).await;
        let now = Utc::now().trunc_subsecs(3);

        let row = InsertItem {
            agent_id: memory.agent_id,
            thread_id: memory.thread_id,
            scope,
            item_type: MemoryType::Profile,
            content,
            embedding,
            metadata: memory.metadata,
            created_at: now,
            importance: memory.importance,
            raw_content: (!raw.is_empty()).then(|| memory.raw_text.clone()),
            memory_type: Some(memory.memory_type).filter(|t| !t.is_empty()),
            tags: memory.tags,
        };
        let item = self.insert_indexed(row).await?;

        counter!("recall_memory_writes_total", "kind" => "personal").increment(1);
        debug!(
            id = item.id,
            scope = %item.scope,
            memory_type = item.memory_type.as_deref().unwrap_or(""),
            tags = item.tags.len(),
            "personal memory stored"
        );
        Ok(item)
    }

    /// Persist a durable document. Artifacts are never indexed or embedded.
    pub async fn create_artifact(&self, artifact: NewArtifact) -> Result<Artifact, RecallError> {
        if artifact.body.trim().is_empty() {
            return Err(RecallError::Validation("artifact body must not be empty".into()));
        }
        validate_attribution(
            artifact.scope,
            artifact.agent_id.as_deref(),
            artifact.thread_id.as_deref(),
        )?;

        let now = Utc::now().trunc_subsecs(3);
        let ts = now.timestamp_millis();
        let metadata_json = serde_json::to_string(&artifact.metadata)?;
        let agent_id = artifact.agent_id.clone();
        let thread_id = artifact.thread_id.clone();
        let scope = artifact.scope.as_str();
        let title = artifact.title.clone();
        let body = artifact.body.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO artifacts (agent_id, thread_id, scope, title, body, metadata, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                    params![agent_id, thread_id, scope, title, body, metadata_json, ts],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)?;

        counter!("recall_memory_writes_total", "kind" => "artifact").increment(1);
        debug!(id, scope, "artifact stored");
        Ok(Artifact {
            id,
            agent_id: artifact.agent_id,
            thread_id: artifact.thread_id,
            scope: artifact.scope,
            title: artifact.title,
            body: artifact.body,
            metadata: artifact.metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a memory item by id.
    pub async fn get_item(&self, id: i64) -> Result<Option<MemoryItem>, RecallError> {
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM memory_items m WHERE m.id = ?1"
                ))?;
                stmt.query_row(params![id], ItemRow::from_row).optional()
            })
            .await
            .map_err(map_tr_err)?;
        row.map(ItemRow::into_item).transpose()
    }

    /// Total number of memory items.
    pub async fn count_items(&self) -> Result<i64, RecallError> {
        self.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM memory_items", [], |row| row.get(0)))
            .await
            .map_err(map_tr_err)
    }

    /// Agent-scoped episodes of one thread created at or after `since`, oldest first.
    pub async fn recent_episodes(
        &self,
        agent_id: &str,
        thread_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MemoryItem>, RecallError> {
        let agent_id = agent_id.to_string();
        let thread_id = thread_id.to_string();
        let since = since.timestamp_millis();
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM memory_items m \
                     WHERE m.type = 'episode' AND m.scope = 'agent' \
                       AND m.agent_id = ?1 AND m.thread_id = ?2 AND m.created_at >= ?3 \
                     ORDER BY m.created_at ASC, m.id ASC"
                ))?;
                stmt.query_map(params![agent_id, thread_id, since], ItemRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Get an artifact by id.
    pub async fn get_artifact(&self, id: i64) -> Result<Option<Artifact>, RecallError> {
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTIFACT_COLUMNS} FROM artifacts a WHERE a.id = ?1"
                ))?;
                stmt.query_row(params![id], ArtifactRow::from_row).optional()
            })
            .await
            .map_err(map_tr_err)?;
        row.map(ArtifactRow::into_artifact).transpose()
    }

    /// List artifacts newest first, using the same agent selector as search.
    pub async fn list_artifacts(
        &self,
        agent_id: Option<&str>,
        include_global: bool,
        limit: usize,
    ) -> Result<Vec<Artifact>, RecallError> {
        let mut filter = SqlFilter::default();
        filter.scope("a", agent_id, include_global);
        let (clause, mut values) = filter.finish();
        values.push(Value::Integer(to_sql_limit(limit)));

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ARTIFACT_COLUMNS} FROM artifacts a WHERE {clause} \
                     ORDER BY a.created_at DESC, a.id DESC LIMIT ?"
                ))?;
                stmt.query_map(params_from_iter(values.iter()), ArtifactRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)?;
        rows.into_iter().map(ArtifactRow::into_artifact).collect()
    }

    /// Delete every memory item and every index row in one transaction.
    ///
    /// Artifacts are untouched. Ids are not reused afterwards.
    pub async fn clear_all(&self) -> Result<usize, RecallError> {
        let deleted = self
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let deleted = tx.execute("DELETE FROM memory_items", [])?;
                tx.execute("DELETE FROM memory_fts", [])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(map_tr_err)?;
        warn!(deleted, "memory store cleared");
        Ok(deleted)
    }

    /// Run the keyword, vector and tag strategies and combine their results.
    ///
    /// Keyword candidates come from FTS5 (capped at
    /// `keyword_candidate_multiplier * limit`). Vector and tag candidates
    /// come from the `candidate_window` most recent rows matching the
    /// filters. Every strategy re-checks the full filter in process.
    pub async fn search_memory(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, RecallError> {
        let limit = query.effective_limit(self.default_limit);
        let match_expr = fts_query(&query.text);
        let query_embedding = query.embedding.as_deref().filter(|e| !e.is_empty());
        let wants_window = query_embedding.is_some() || !query.tags.is_empty();
        let keyword_cap = limit.saturating_mul(self.keyword_multiplier);

        let keyword_fut = async {
            match &match_expr {
                Some(expr) => self.keyword_candidates(expr, query, keyword_cap).await,
                None => Ok(Vec::new()),
            }
        };
        let window_fut = async {
            if wants_window {
                self.window_candidates(query).await
            } else {
                Ok(Vec::new())
            }
        };
        let (keyword_hits, window) = tokio::try_join!(keyword_fut, window_fut)?;

        let vector = match query_embedding {
            Some(embedding) => vector_results(&window, query, embedding),
            None => Vec::new(),
        };
        let tag = if query.tags.is_empty() {
            Vec::new()
        } else {
            tag_results(&window, query)
        };
        let keyword = keyword_results(keyword_hits, query);

        debug!(
            vector = vector.len(),
            tag = tag.len(),
            keyword = keyword.len(),
            window = window.len(),
            hybrid = query.hybrid,
            limit,
            "search strategies complete"
        );
        let mode = if query.hybrid { "hybrid" } else { "priority" };
        counter!("recall_memory_searches_total", "mode" => mode).increment(1);

        Ok(if query.hybrid {
            merge_hybrid(vector, tag, keyword, limit)
        } else {
            select_non_hybrid(vector, tag, keyword, limit)
        })
    }

    async fn keyword_candidates(
        &self,
        match_expr: &str,
        query: &SearchQuery,
        cap: usize,
    ) -> Result<Vec<MemoryItem>, RecallError> {
        let mut filter = SqlFilter::default();
        filter.push_value(Value::Text(match_expr.to_string()));
        filter.query(query);
        let (clause, mut values) = filter.finish_with("memory_fts MATCH ?");
        values.push(Value::Integer(to_sql_limit(cap)));

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM memory_fts \
                     JOIN memory_items m ON m.id = memory_fts.rowid \
                     WHERE {clause} ORDER BY bm25(memory_fts) LIMIT ?"
                ))?;
                stmt.query_map(params_from_iter(values.iter()), ItemRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    async fn window_candidates(&self, query: &SearchQuery) -> Result<Vec<MemoryItem>, RecallError> {
        let mut filter = SqlFilter::default();
        filter.query(query);
        let (clause, mut values) = filter.finish();
        values.push(Value::Integer(to_sql_limit(self.candidate_window)));

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM memory_items m WHERE {clause} \
                     ORDER BY m.created_at DESC, m.id DESC LIMIT ?"
                ))?;
                stmt.query_map(params_from_iter(values.iter()), ItemRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    async fn insert_indexed(&self, row: InsertItem) -> Result<MemoryItem, RecallError> {
        let metadata_json = serde_json::to_string(&row.metadata)?;
        let tags_json = if row.tags.is_empty() && row.item_type != MemoryType::Profile {
            None
        } else {
            Some(serde_json::to_string(&row.tags)?)
        };
        let blob = row.embedding.as_deref().and_then(encode);
        let ts = row.created_at.timestamp_millis();
        let agent_id = row.agent_id.clone();
        let thread_id = row.thread_id.clone();
        let scope = row.scope.as_str();
        let item_type = row.item_type.as_str();
        let content = row.content.clone();
        let importance = row.importance;
        let raw_content = row.raw_content.clone();
        let memory_type = row.memory_type.clone();

        let id = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO memory_items (agent_id, thread_id, scope, type, content, embedding, metadata, \
                     created_at, updated_at, importance, raw_content, memory_type, tags_json) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        agent_id,
                        thread_id,
                        scope,
                        item_type,
                        content,
                        blob,
                        metadata_json,
                        ts,
                        importance,
                        raw_content,
                        memory_type,
                        tags_json
                    ],
                )?;
                let id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO memory_fts (rowid, content) VALUES (?1, ?2)",
                    params![id, content],
                )?;
                tx.commit()?;
                Ok(id)
            })
            .await
            .map_err(map_tr_err)?;

        Ok(MemoryItem {
            id,
            agent_id: row.agent_id,
            thread_id: row.thread_id,
            scope: row.scope,
            item_type: row.item_type,
            content: row.content,
            embedding: row.embedding,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.created_at,
            importance: row.importance,
            raw_content: row.raw_content,
            memory_type: row.memory_type,
            tags: row.tags,
        })
    }
}

/// Shared attribution rules for items and artifacts.
fn validate_attribution(
    scope: Scope,
    agent_id: Option<&str>,
    thread_id: Option<&str>,
) -> Result<(), RecallError> {
    if agent_id.is_some_and(|a| a.trim().is_empty()) {
        return Err(RecallError::Validation("agent_id must not be blank".into()));
    }
    if thread_id.is_some_and(|t| t.trim().is_empty()) {
        return Err(RecallError::Validation("thread_id must not be blank".into()));
    }
    match (scope, agent_id) {
        (Scope::Agent, None) => Err(RecallError::Validation(
            "agent scope requires an agent_id".into(),
        )),
        (Scope::Global, Some(_)) => Err(RecallError::Validation(
            "global scope must not carry an agent_id".into(),
        )),
        _ => Ok(()),
    }
}

fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, RecallError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RecallError::Internal(format!("timestamp out of range: {ms}")))
}

fn parse_metadata(raw: Option<String>) -> Result<Metadata, RecallError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("null") => Ok(Metadata::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

/// WHERE-clause builder using anonymous `?` placeholders.
#[derive(Default)]
struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    fn push_value(&mut self, value: Value) {
        self.values.push(value);
    }

    fn scope(&mut self, alias: &str, agent_id: Option<&str>, include_global: bool) {
        match (agent_id, include_global) {
            (Some(agent), false) => {
                self.clauses
                    .push(format!("({alias}.scope = 'agent' AND {alias}.agent_id = ?)"));
                self.values.push(Value::Text(agent.to_string()));
            }
            (Some(agent), true) => {
                self.clauses.push(format!(
                    "(({alias}.scope = 'agent' AND {alias}.agent_id = ?) OR {alias}.scope = 'global')"
                ));
                self.values.push(Value::Text(agent.to_string()));
            }
            (None, true) => self.clauses.push(format!("{alias}.scope = 'global'")),
            (None, false) => {}
        }
    }

    fn query(&mut self, query: &SearchQuery) {
        self.scope("m", query.agent_id.as_deref(), query.include_global);
        if !query.types.is_empty() {
            let placeholders = vec!["?"; query.types.len()].join(", ");
            self.clauses.push(format!("m.type IN ({placeholders})"));
            self.values.extend(
                query
                    .types
                    .iter()
                    .map(|t| Value::Text(t.as_str().to_string())),
            );
        }
        if let Some(memory_type) = &query.memory_type {
            self.clauses.push("m.memory_type = ?".into());
            self.values.push(Value::Text(memory_type.clone()));
        }
        if let Some(min) = query.min_importance {
            self.clauses.push("m.importance >= ?".into());
            self.values.push(Value::Real(min));
        }
        if let Some(since) = query.since {
            self.clauses.push("m.created_at >= ?".into());
            self.values.push(Value::Integer(since.timestamp_millis()));
        }
        if let Some(until) = query.until {
            self.clauses.push("m.created_at <= ?".into());
            self.values.push(Value::Integer(until.timestamp_millis()));
        }
    }

    fn finish(self) -> (String, Vec<Value>) {
        let clause = if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        };
        (clause, self.values)
    }

    /// Like [`finish`](Self::finish) with `leading` (whose placeholders were
    /// pushed first) placed ahead of the other clauses.
    fn finish_with(mut self, leading: &str) -> (String, Vec<Value>) {
        self.clauses.insert(0, leading.to_string());
        self.finish()
    }
}

struct InsertItem {
    agent_id: Option<String>,
    thread_id: Option<String>,
    scope: Scope,
    item_type: MemoryType,
    content: String,
    embedding: Option<Vec<f32>>,
    metadata: Metadata,
    created_at: DateTime<Utc>,
    importance: f64,
    raw_content: Option<String>,
    memory_type: Option<String>,
    tags: Vec<String>,
}

/// Raw column values; converted outside the connection thread.
struct ItemRow {
    id: i64,
    agent_id: Option<String>,
    thread_id: Option<String>,
    scope: String,
    item_type: String,
    content: String,
    embedding: Option<Vec<u8>>,
    metadata: Option<String>,
    created_at: i64,
    updated_at: i64,
    importance: f64,
    raw_content: Option<String>,
    memory_type: Option<String>,
    tags_json: Option<String>,
}

impl ItemRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            thread_id: row.get(2)?,
            scope: row.get(3)?,
            item_type: row.get(4)?,
            content: row.get(5)?,
            embedding: row.get(6)?,
            metadata: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            importance: row.get(10)?,
            raw_content: row.get(11)?,
            memory_type: row.get(12)?,
            tags_json: row.get(13)?,
        })
    }

    fn into_item(self) -> Result<MemoryItem, RecallError> {
        let embedding = match self.embedding.as_deref() {
            None | Some([]) => None,
            Some(blob) => match decode(blob) {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!(id = self.id, error = %e, "ignoring undecodable embedding");
                    None
                }
            },
        };
        let tags = match self.tags_json.as_deref() {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json)?,
        };
        Ok(MemoryItem {
            id: self.id,
            agent_id: self.agent_id,
            thread_id: self.thread_id,
            scope: self.scope.parse().map_err(internal_column)?,
            item_type: self.item_type.parse().map_err(internal_column)?,
            content: self.content,
            embedding,
            metadata: parse_metadata(self.metadata)?,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
            importance: self.importance,
            raw_content: self.raw_content,
            memory_type: self.memory_type,
            tags,
        })
    }
}

struct ArtifactRow {
    id: i64,
    agent_id: Option<String>,
    thread_id: Option<String>,
    scope: String,
    title: Option<String>,
    body: String,
    metadata: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl ArtifactRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            thread_id: row.get(2)?,
            scope: row.get(3)?,
            title: row.get(4)?,
            body: row.get(5)?,
            metadata: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_artifact(self) -> Result<Artifact, RecallError> {
        Ok(Artifact {
            id: self.id,
            agent_id: self.agent_id,
            thread_id: self.thread_id,
            scope: self.scope.parse().map_err(internal_column)?,
            title: self.title,
            body: self.body,
            metadata: parse_metadata(self.metadata)?,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

/// A stored enum column held a value the schema CHECK should have rejected.
fn internal_column(e: RecallError) -> RecallError {
    RecallError::Internal(format!("corrupt row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, KeywordEmbedder};
    use serde_json::json;

    async fn store_with(embedder: Option<Arc<dyn EmbeddingAdapter>>) -> (MemoryStore, Database) {
        let db = Database::open_in_memory().await.unwrap();
        let store = MemoryStore::new(&db, embedder, &MemoryConfig::default());
        (store, db)
    }

    async fn store() -> MemoryStore {
        store_with(None).await.0
    }

    async fn fts_count(db: &Database) -> i64 {
        db.connection()
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM memory_fts", [], |r| r.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn remember_round_trips_through_get_item() {
        let store = store().await;
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!({"nested": [1, 2]}));
        let saved = store
            .remember(
                NewMemory::new(MemoryType::Episode, Scope::Agent, "User asked about trains")
                    .agent("planner")
                    .thread("t-1")
                    .importance(0.3)
                    .metadata(metadata.clone()),
            )
            .await
            .unwrap();

        let loaded = store.get_item(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.created_at, loaded.updated_at);
        assert!(loaded.embedding.is_none());
    }

    #[tokio::test]
    async fn remember_rejects_empty_content_without_side_effects() {
        let store = store().await;
        let err = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "   "))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remember_rejects_agent_scope_without_agent() {
        let store = store().await;
        let err = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "orphan"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "blank").agent(""))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn every_item_has_one_index_row() {
        let (store, db) = store_with(None).await;
        for i in 0..3 {
            store
                .remember(NewMemory::new(MemoryType::Fact, Scope::Global, format!("fact {i}")))
                .await
                .unwrap();
        }
        assert_eq!(store.count_items().await.unwrap(), 3);
        assert_eq!(fts_count(&db).await, 3);
    }

    #[tokio::test]
    async fn failed_index_insert_rolls_back_primary_row() {
        let (store, db) = store_with(None).await;
        db.connection()
            .call(|conn| conn.execute_batch("DROP TABLE memory_fts;"))
            .await
            .unwrap();

        let err = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "never half-written"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }));
        assert_eq!(store.count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_still_writes() {
        let (store, _db) = store_with(Some(Arc::new(FailingEmbedder))).await;
        let item = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "kept anyway"))
            .await
            .unwrap();
        assert!(item.embedding.is_none());
        assert_eq!(store.count_items().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn embedding_is_stored_and_decoded() {
        let (store, _db) = store_with(Some(Arc::new(KeywordEmbedder))).await;
        let item = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "ruby python"))
            .await
            .unwrap();
        let loaded = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(loaded.embedding, item.embedding);
        assert!(loaded.embedding.is_some());
    }

    #[tokio::test]
    async fn personal_memory_indexes_normalized_text() {
        let store = store().await;
        let item = store
            .store_personal_memory(PersonalMemory {
                raw_text: "i rly like green tea".into(),
                normalized_text: "The user likes green tea.".into(),
                memory_type: "preference".into(),
                tags: vec!["tea".into(), "drinks".into()],
                importance: 0.8,
                ..PersonalMemory::default()
            })
            .await
            .unwrap();
        assert_eq!(item.scope, Scope::Global);
        assert_eq!(item.item_type, MemoryType::Profile);
        assert_eq!(item.content, "The user likes green tea.");
        assert_eq!(item.raw_content.as_deref(), Some("i rly like green tea"));

        let hits = store
            .search_memory(&SearchQuery::new("likes").include_global(true))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let hits = store
            .search_memory(&SearchQuery::new("rly").include_global(true))
            .await
            .unwrap();
        assert!(hits.is_empty());

        let loaded = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["tea".to_string(), "drinks".to_string()]);
        assert_eq!(loaded.memory_type.as_deref(), Some("preference"));
    }

    #[tokio::test]
    async fn personal_memory_falls_back_to_raw() {
        let store = store().await;
        let item = store
            .store_personal_memory(PersonalMemory {
                agent_id: Some("coach".into()),
                raw_text: "runs every morning".into(),
                normalized_text: "  ".into(),
                memory_type: "habit".into(),
                ..PersonalMemory::default()
            })
            .await
            .unwrap();
        assert_eq!(item.content, "runs every morning");
        assert_eq!(item.scope, Scope::Agent);
    }

    #[tokio::test]
    async fn personal_memory_rejects_blank_input() {
        let store = store().await;
        let err = store
            .store_personal_memory(PersonalMemory::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn artifacts_are_listed_by_scope_and_not_searchable() {
        let (store, db) = store_with(None).await;
        let mine = store
            .create_artifact(NewArtifact {
                scope: Scope::Agent,
                agent_id: Some("writer".into()),
                thread_id: None,
                title: Some("Draft".into()),
                body: "Ruby core systems draft".into(),
                metadata: Metadata::new(),
            })
            .await
            .unwrap();
        let shared = store
            .create_artifact(NewArtifact {
                scope: Scope::Global,
                agent_id: None,
                thread_id: None,
                title: None,
                body: "Shared notes".into(),
                metadata: Metadata::new(),
            })
            .await
            .unwrap();

        assert_eq!(store.get_artifact(mine.id).await.unwrap().unwrap(), mine);
        assert!(store.get_artifact(9999).await.unwrap().is_none());

        let writer_only = store.list_artifacts(Some("writer"), false, 10).await.unwrap();
        assert_eq!(writer_only.len(), 1);
        let writer_and_global = store.list_artifacts(Some("writer"), true, 10).await.unwrap();
        assert_eq!(writer_and_global[0].id, shared.id);
        assert_eq!(writer_and_global.len(), 2);

        assert_eq!(fts_count(&db).await, 0);
        let hits = store
            .search_memory(&SearchQuery::new("Ruby"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn keyword_search_scoped_to_agent() {
        let store = store().await;
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "likes Ruby").agent("a"))
            .await
            .unwrap();
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "likes Ruby too").agent("b"))
            .await
            .unwrap();
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "Ruby is global"))
            .await
            .unwrap();

        let hits = store
            .search_memory(&SearchQuery::new("Ruby").for_agent("a"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits.iter().all(|h| h.item.scope == Scope::Agent
            && h.item.agent_id.as_deref() == Some("a")));
        assert_eq!(hits[0].score, 1.0);

        let hits = store
            .search_memory(&SearchQuery::new("Ruby").for_agent("a").include_global(true))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn keyword_candidates_are_capped() {
        let (store, _db) = store_with(None).await;
        for i in 0..10 {
            store
                .remember(NewMemory::new(MemoryType::Fact, Scope::Global, format!("apple {i}")))
                .await
                .unwrap();
        }
        let hits = store
            .search_memory(&SearchQuery::new("apple").limit(2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn punctuation_only_query_returns_empty() {
        let store = store().await;
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "anything"))
            .await
            .unwrap();
        let hits = store.search_memory(&SearchQuery::new("\"*(")).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn tag_strategy_scores_overlap() {
        let store = store().await;
        for (text, tags) in [
            ("The user likes tea.", vec!["tea", "drinks"]),
            ("The user codes in Rust.", vec!["rust", "work"]),
        ] {
            store
                .store_personal_memory(PersonalMemory {
                    raw_text: text.into(),
                    normalized_text: text.into(),
                    memory_type: "preference".into(),
                    tags: tags.into_iter().map(String::from).collect(),
                    ..PersonalMemory::default()
                })
                .await
                .unwrap();
        }
        let hits = store
            .search_memory(&SearchQuery::new("").with_tags(["tea"]).include_global(true))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.content, "The user likes tea.");
        // m=1, |q|=1, |i|=2: 0.7 + 0.3 * 1/2
        assert!((hits[0].score - 0.85).abs() < 1e-12);
    }

    #[tokio::test]
    async fn vector_strategy_wins_non_hybrid_priority() {
        let (store, _db) = store_with(Some(Arc::new(KeywordEmbedder))).await;
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "ruby language"))
            .await
            .unwrap();
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "python snakes"))
            .await
            .unwrap();
        let embedding = store.embed_soft("ruby").await.unwrap();
        let hits = store
            .search_memory(&SearchQuery::new("python").with_embedding(embedding))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.content, "ruby language");
    }

    #[tokio::test]
    async fn window_bounds_vector_candidates() {
        let db = Database::open_in_memory().await.unwrap();
        let config = MemoryConfig {
            candidate_window: 2,
            ..MemoryConfig::default()
        };
        let store = MemoryStore::new(&db, Some(Arc::new(KeywordEmbedder)), &config);
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "ruby oldest"))
            .await
            .unwrap();
        for i in 0..2 {
            store
                .remember(NewMemory::new(MemoryType::Fact, Scope::Global, format!("other {i}")))
                .await
                .unwrap();
        }
        let embedding = store.embed_soft("ruby").await.unwrap();
        let hits = store
            .search_memory(&SearchQuery::new("").with_embedding(embedding))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_filters_by_type_and_importance() {
        let store = store().await;
        store
            .remember(NewMemory::new(MemoryType::Episode, Scope::Agent, "deploy failed").agent("ops").importance(0.3))
            .await
            .unwrap();
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "deploy uses blue green").agent("ops").importance(0.7))
            .await
            .unwrap();

        let facts = store
            .search_memory(&SearchQuery::new("deploy").for_agent("ops").with_types([MemoryType::Fact]))
            .await
            .unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].item.item_type, MemoryType::Fact);

        let important = store
            .search_memory(&SearchQuery::new("deploy").for_agent("ops").with_min_importance(0.5))
            .await
            .unwrap();
        assert_eq!(important.len(), 1);
        assert_eq!(important[0].item.importance, 0.7);
    }

    #[tokio::test]
    async fn recent_episodes_are_oldest_first_and_thread_bound() {
        let store = store().await;
        for text in ["first", "second"] {
            store
                .remember(NewMemory::new(MemoryType::Episode, Scope::Agent, text).agent("a").thread("t"))
                .await
                .unwrap();
        }
        store
            .remember(NewMemory::new(MemoryType::Episode, Scope::Agent, "elsewhere").agent("a").thread("u"))
            .await
            .unwrap();
        store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Agent, "not an episode").agent("a").thread("t"))
            .await
            .unwrap();

        let since = Utc::now() - chrono::Duration::days(7);
        let episodes = store.recent_episodes("a", "t", since).await.unwrap();
        let contents: Vec<_> = episodes.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);

        let future = Utc::now() + chrono::Duration::days(1);
        assert!(store.recent_episodes("a", "t", future).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_all_removes_items_and_index_but_not_artifacts() {
        let (store, db) = store_with(None).await;
        let first = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "to be cleared"))
            .await
            .unwrap();
        store
            .create_artifact(NewArtifact {
                scope: Scope::Global,
                agent_id: None,
                thread_id: None,
                title: None,
                body: "survives".into(),
                metadata: Metadata::new(),
            })
            .await
            .unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 1);
        assert_eq!(store.count_items().await.unwrap(), 0);
        assert_eq!(fts_count(&db).await, 0);
        assert_eq!(store.list_artifacts(None, false, 10).await.unwrap().len(), 1);

        let next = store
            .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "after clear"))
            .await
            .unwrap();
        assert!(next.id > first.id);
    }
}
