// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end memory tests.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! wires a [`MemoryStore`] and [`MemoryRouter`] over it, optionally with a
//! [`MockEmbedder`]. The normalizer and episode summarizer share one
//! [`MockProvider`] whose replies the test scripts up front.

use std::sync::Arc;

use recall_config::model::{CompletionConfig, MemoryConfig};
use recall_core::{EmbeddingAdapter, ProviderAdapter, RecallError};
use recall_memory::{LlmEpisodeSummarizer, MemoryRouter, MemoryStore, Normalizer};
use recall_storage::Database;

use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::MockProvider;

const MOCK_MODEL: &str = "mock-model";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    embedder: Option<Arc<MockEmbedder>>,
    memory: MemoryConfig,
    mock_responses: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            embedder: None,
            memory: MemoryConfig::default(),
            mock_responses: Vec::new(),
        }
    }

    /// Set mock provider responses (returned in FIFO order).
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.mock_responses = responses;
        self
    }

    /// Attach a mock embedder (shared so tests can toggle its failure mode).
    pub fn with_embedder(mut self, embedder: Arc<MockEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Override the memory tuning knobs.
    pub fn with_memory_config(mut self, config: MemoryConfig) -> Self {
        self.memory = config;
        self
    }

    /// Build the harness, creating the temp database and all components.
    pub async fn build(self) -> Result<TestHarness, RecallError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| RecallError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("memory.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let embedder: Option<Arc<dyn EmbeddingAdapter>> = self
            .embedder
            .clone()
            .map(|e| e as Arc<dyn EmbeddingAdapter>);
        let store = Arc::new(MemoryStore::new(&db, embedder, &self.memory));
        let router = MemoryRouter::new(store.clone(), &self.memory);

        let provider = Arc::new(MockProvider::with_responses(self.mock_responses));
        let completion = CompletionConfig {
            model: MOCK_MODEL.to_string(),
            ..CompletionConfig::default()
        };
        let shared: Arc<dyn ProviderAdapter> = provider.clone();
        let normalizer = Normalizer::new(shared.clone(), &completion);
        let summarizer = LlmEpisodeSummarizer::new(shared, &completion);

        Ok(TestHarness {
            db,
            store,
            router,
            embedder: self.embedder,
            provider,
            normalizer,
            summarizer,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete memory stack over a temp database.
pub struct TestHarness {
    pub db: Database,
    pub store: Arc<MemoryStore>,
    pub router: MemoryRouter,
    pub embedder: Option<Arc<MockEmbedder>>,
    pub provider: Arc<MockProvider>,
    pub normalizer: Normalizer,
    pub summarizer: LlmEpisodeSummarizer,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run raw SQL against the harness database (fault injection).
    pub async fn execute_batch(&self, sql: &'static str) -> Result<(), RecallError> {
        self.db
            .connection()
            .call(move |conn| conn.execute_batch(sql))
            .await
            .map_err(recall_storage::map_tr_err)
    }

    /// Rows in the full-text index.
    pub async fn index_row_count(&self) -> Result<i64, RecallError> {
        self.db
            .connection()
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM memory_fts", [], |row| row.get(0)))
            .await
            .map_err(recall_storage::map_tr_err)
    }
}
