// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the memory pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite database and
//! mock collaborators. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use recall_memory::embedding::{cosine_similarity, decode, encode};
use recall_memory::search::merge_hybrid;
use recall_memory::{
    MemoryItem, MemoryType, Metadata, NewMemory, PersonalMemory, Scope, SearchQuery, SearchResult,
    sanitize_memory_type, sanitize_tags,
};
use recall_test_utils::{MockEmbedder, MockSummarizer, TestHarness};

const ADAM_FACT: &str = "Adam prefers Ruby over Python for core systems.";

fn item(id: i64) -> MemoryItem {
    let now = Utc::now();
    MemoryItem {
        id,
        agent_id: None,
        thread_id: None,
        scope: Scope::Global,
        item_type: MemoryType::Fact,
        content: format!("item {id}"),
        embedding: None,
        metadata: Metadata::new(),
        created_at: now,
        updated_at: now,
        importance: 0.5,
        raw_content: None,
        memory_type: None,
        tags: Vec::new(),
    }
}

fn hit(id: i64, score: f64) -> SearchResult {
    SearchResult {
        item: item(id),
        score,
    }
}

// ---- Embedding codec and similarity ----

#[test]
fn blob_codec_is_bit_exact_and_rejects_ragged_input() {
    let v = vec![0.1f32, -2.5, f32::MIN_POSITIVE, 1e30];
    let bytes = encode(&v).unwrap();
    let back = decode(&bytes).unwrap();
    assert_eq!(
        v.iter().map(|f| f.to_bits()).collect::<Vec<_>>(),
        back.iter().map(|f| f.to_bits()).collect::<Vec<_>>()
    );
    assert!(decode(&bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn cosine_is_symmetric_and_degenerate_cases_score_zero() {
    let a = [1.0f32, 2.0, 3.0];
    let b = [3.0f32, -1.0, 0.5];
    assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    assert_eq!(cosine_similarity(&a, &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
}

// ---- Keyword retrieval ----

#[tokio::test]
async fn keyword_search_finds_global_fact() {
    let h = TestHarness::builder().build().await.unwrap();
    let fact = h
        .router
        .add_global_fact(ADAM_FACT, Metadata::new())
        .await
        .unwrap();

    let query = SearchQuery::new("Ruby core systems").include_global(true);
    let results = h.store.search_memory(&query).await.unwrap();
    assert!(results.iter().any(|r| r.item.id == fact.id));
    assert_eq!(h.index_row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn hybrid_search_ranks_the_matching_fact_first() {
    let h = TestHarness::builder()
        .with_embedder(Arc::new(MockEmbedder::new()))
        .build()
        .await
        .unwrap();
    let fact = h
        .router
        .add_global_fact(ADAM_FACT, Metadata::new())
        .await
        .unwrap();
    h.router
        .add_global_fact("The office coffee machine is broken.", Metadata::new())
        .await
        .unwrap();

    let results = h
        .router
        .query_global_memory("Ruby core systems", 5)
        .await
        .unwrap();
    assert_eq!(results[0].item.id, fact.id);
    assert!(results[0].item.embedding.is_some());
}

#[tokio::test]
async fn embedder_outage_falls_back_to_keyword() {
    let embedder = Arc::new(MockEmbedder::new());
    let h = TestHarness::builder()
        .with_embedder(embedder.clone())
        .build()
        .await
        .unwrap();
    let fact = h
        .router
        .add_global_fact(ADAM_FACT, Metadata::new())
        .await
        .unwrap();

    embedder.set_failing(true);
    let results = h
        .router
        .query_global_memory("Ruby core systems", 5)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].item.id, fact.id);

    let stored = h
        .router
        .add_global_fact("Written while the embedder is down.", Metadata::new())
        .await
        .unwrap();
    assert!(stored.embedding.is_none());
}

#[test]
fn hybrid_merge_weights_combined_hits_above_single_strategy() {
    let merged = merge_hybrid(
        vec![hit(1, 0.8), hit(2, 0.9)],
        vec![hit(1, 1.0)],
        vec![hit(1, 1.0)],
        10,
    );
    assert_eq!(merged[0].item.id, 1);
    assert!((merged[0].score - 0.9).abs() < 1e-9);
    assert_eq!(merged[1].item.id, 2);
    assert!((merged[1].score - 0.45).abs() < 1e-9);
}

// ---- Scope isolation ----

#[tokio::test]
async fn agent_filter_without_global_returns_only_that_agent() {
    let h = TestHarness::builder()
        .with_embedder(Arc::new(MockEmbedder::new()))
        .build()
        .await
        .unwrap();
    h.router
        .add_agent_fact("planner", "deploys happen on tuesday", Metadata::new())
        .await
        .unwrap();
    h.router
        .add_agent_fact("coder", "deploys use blue green rollout", Metadata::new())
        .await
        .unwrap();
    h.router
        .add_global_fact("deploys are frozen in december", Metadata::new())
        .await
        .unwrap();
    h.router
        .add_episode("planner", "t1", "discussed deploys with the team", Metadata::new())
        .await
        .unwrap();

    let results = h
        .router
        .query_agent_memory("planner", "deploys", 10, false)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    for r in &results {
        assert_eq!(r.item.scope, Scope::Agent);
        assert_eq!(r.item.agent_id.as_deref(), Some("planner"));
    }

    let with_global = h
        .router
        .query_agent_memory("planner", "deploys", 10, true)
        .await
        .unwrap();
    assert_eq!(with_global.len(), 3);
    assert!(
        with_global
            .iter()
            .all(|r| r.item.agent_id.as_deref() != Some("coder"))
    );
}

// ---- Personal memory ----

#[tokio::test]
async fn personal_memory_without_text_is_rejected() {
    let h = TestHarness::builder().build().await.unwrap();
    let err = h
        .store
        .store_personal_memory(PersonalMemory {
            raw_text: "   ".into(),
            normalized_text: String::new(),
            memory_type: "other".into(),
            ..PersonalMemory::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.store.count_items().await.unwrap(), 0);
    assert_eq!(h.index_row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn normalize_empty_input_makes_no_call() {
    let h = TestHarness::builder().build().await.unwrap();
    let err = h.normalizer.normalize("").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn personal_pipeline_normalizes_stores_and_retrieves_by_tag() {
    let h = TestHarness::builder()
        .with_mock_responses(vec![
            r#"Sure! {"normalized": "User prefers dark roast coffee.", "type": "Preference", "tags": ["Coffee", "morning routine!", "coffee"]}"#
                .to_string(),
        ])
        .build()
        .await
        .unwrap();

    let raw = "honestly i only drink dark roast";
    let normalized = h.normalizer.normalize(raw).await.unwrap();
    assert_eq!(normalized.normalized, "User prefers dark roast coffee.");
    assert_eq!(normalized.memory_type, "preference");
    assert_eq!(normalized.tags, vec!["coffee", "morning_routine"]);

    let item = h
        .router
        .add_personal_memory(None, raw, &normalized, None)
        .await
        .unwrap();
    assert_eq!(item.item_type, MemoryType::Profile);
    assert_eq!(item.scope, Scope::Global);
    assert_eq!(item.raw_content.as_deref(), Some(raw));

    let results = h
        .router
        .query_personal_memory(None, "", &["coffee".to_string()], 5)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].item.id, item.id);
}

#[test]
fn sanitizers_always_produce_contract_values() {
    let tags = sanitize_tags(&["", "  ", "!!!"]);
    assert_eq!(tags, vec!["misc"]);

    let many: Vec<String> = (0..20).map(|i| format!("Tag {i}")).collect();
    let tags = sanitize_tags(&many);
    assert_eq!(tags.len(), 8);
    assert!(tags.iter().all(|t| {
        !t.is_empty()
            && t.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }));

    assert_eq!(sanitize_memory_type("GOAL"), "goal");
    assert_eq!(sanitize_memory_type("hobby"), "other");
}

// ---- Reflection ----

#[tokio::test]
async fn reflection_without_episodes_is_not_found() {
    let h = TestHarness::builder().build().await.unwrap();
    let summarizer = MockSummarizer::returning("should not be stored");
    let err = h
        .router
        .reflect("planner", "empty-thread", &summarizer)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(summarizer.call_count(), 0);
    assert_eq!(h.store.count_items().await.unwrap(), 0);
}

#[tokio::test]
async fn reflection_consolidates_episodes_into_global_fact() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["Adam is migrating billing to Rust.".to_string()])
        .build()
        .await
        .unwrap();
    h.router
        .add_episode("planner", "t1", "Adam asked about Rust ORMs", Metadata::new())
        .await
        .unwrap();
    h.router
        .add_episode("planner", "t1", "Adam scheduled the billing rewrite", Metadata::new())
        .await
        .unwrap();

    let fact = h
        .router
        .reflect("planner", "t1", &h.summarizer)
        .await
        .unwrap();
    assert_eq!(fact.scope, Scope::Global);
    assert_eq!(fact.item_type, MemoryType::Fact);
    assert!(fact.agent_id.is_none());
    assert_eq!(fact.content, "Adam is migrating billing to Rust.");
    assert_eq!(fact.metadata["source"], "reflection");
    assert_eq!(fact.metadata["thread_id"], "t1");

    let prompt = &h.provider.requests().await[0].messages[0].content;
    assert!(prompt.contains("Adam asked about Rust ORMs"));
    assert!(prompt.contains("Adam scheduled the billing rewrite"));
}

#[tokio::test]
async fn auto_reflect_respects_min_interval() {
    let h = TestHarness::builder().build().await.unwrap();
    h.router
        .add_episode("planner", "t1", "standup notes", Metadata::new())
        .await
        .unwrap();
    let summarizer = MockSummarizer::returning("Standups happen daily.");
    let mut last = None;

    let first = h
        .router
        .auto_reflect("planner", "t1", &summarizer, &mut last, Some(Duration::from_secs(3600)))
        .await
        .unwrap();
    assert!(first.is_some());
    assert!(last.is_some());

    let second = h
        .router
        .auto_reflect("planner", "t1", &summarizer, &mut last, Some(Duration::from_secs(3600)))
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(summarizer.call_count(), 1);
}

#[tokio::test]
async fn summarizer_failure_stores_nothing() {
    let h = TestHarness::builder().build().await.unwrap();
    h.router
        .add_episode("planner", "t1", "something happened", Metadata::new())
        .await
        .unwrap();
    let summarizer = MockSummarizer::failing("model overloaded");
    assert!(h.router.reflect("planner", "t1", &summarizer).await.is_err());
    assert_eq!(h.store.count_items().await.unwrap(), 1);
}

// ---- Atomicity ----

#[tokio::test]
async fn failed_index_insert_leaves_no_primary_row() {
    let h = TestHarness::builder().build().await.unwrap();
    h.router
        .add_global_fact("kept before the failure", Metadata::new())
        .await
        .unwrap();

    h.execute_batch("DROP TABLE memory_fts;").await.unwrap();
    let result = h
        .store
        .remember(NewMemory::new(MemoryType::Fact, Scope::Global, "lost write"))
        .await;
    assert!(result.is_err());
    assert_eq!(h.store.count_items().await.unwrap(), 1);
}

// ---- Artifacts ----

#[tokio::test]
async fn artifacts_are_stored_but_not_searchable() {
    let h = TestHarness::builder().build().await.unwrap();
    let artifact = h
        .router
        .add_artifact(Some("planner"), Some("t1"), Some("Runbook"), "restart the ruby workers", Metadata::new())
        .await
        .unwrap();
    assert_eq!(artifact.scope, Scope::Agent);

    let fetched = h.store.get_artifact(artifact.id).await.unwrap().unwrap();
    assert_eq!(fetched.body, "restart the ruby workers");

    let listed = h.store.list_artifacts(Some("planner"), false, 10).await.unwrap();
    assert_eq!(listed.len(), 1);

    let results = h
        .router
        .query_agent_memory("planner", "ruby workers", 10, true)
        .await
        .unwrap();
    assert!(results.is_empty());
}
