// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring and fusion for the three retrieval strategies.
//!
//! The store fetches candidates; everything here is pure:
//!
//! - **keyword**: FTS5 hits, each scored 1.0 (FTS5 already orders them)
//! - **vector**: cosine similarity against the query embedding, kept when > 0
//! - **tag**: `0.7 * m/|q| + 0.3 * m/(|i| + |q| - m)` for `m` shared tags
//!
//! Non-hybrid searches return the first non-empty strategy in the order
//! vector, tag, keyword. Hybrid searches merge by item id with weights
//! 0.5 / 0.3 / 0.2 and sort by the merged score.

use std::collections::{HashMap, HashSet};

use crate::embedding::cosine_similarity;
use crate::types::{MemoryItem, Scope, SearchQuery, SearchResult};

pub const VECTOR_WEIGHT: f64 = 0.5;
pub const TAG_WEIGHT: f64 = 0.3;
pub const KEYWORD_WEIGHT: f64 = 0.2;

/// Score assigned to every keyword hit.
pub const KEYWORD_SCORE: f64 = 1.0;

/// Builds an FTS5 `MATCH` expression from free text.
///
/// Each alphanumeric run becomes a quoted term; terms are ANDed implicitly.
/// Returns `None` when the text has no terms.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Whether `item` satisfies every filter on `query` (tags and text excluded).
pub fn matches_filters(item: &MemoryItem, query: &SearchQuery) -> bool {
    let agent_ok = match (&query.agent_id, query.include_global) {
        (Some(agent), false) => {
            item.scope == Scope::Agent && item.agent_id.as_deref() == Some(agent.as_str())
        }
        (Some(agent), true) => {
            item.scope == Scope::Global
                || (item.scope == Scope::Agent && item.agent_id.as_deref() == Some(agent.as_str()))
        }
        (None, true) => item.scope == Scope::Global,
        (None, false) => true,
    };
    if !agent_ok {
        return false;
    }
    if !query.types.is_empty() && !query.types.contains(&item.item_type) {
        return false;
    }
    if let Some(wanted) = &query.memory_type
        && item.memory_type.as_deref() != Some(wanted.as_str())
    {
        return false;
    }
    if let Some(min) = query.min_importance
        && item.importance < min
    {
        return false;
    }
    if let Some(since) = query.since
        && item.created_at < since
    {
        return false;
    }
    if let Some(until) = query.until
        && item.created_at > until
    {
        return false;
    }
    true
}

/// Tag relevance, or `None` when the sets do not intersect.
pub fn tag_score(item_tags: &[String], query_tags: &[String]) -> Option<f64> {
    let item: HashSet<&str> = item_tags.iter().map(String::as_str).collect();
    let query: HashSet<&str> = query_tags.iter().map(String::as_str).collect();
    if item.is_empty() || query.is_empty() {
        return None;
    }
    let matches = item.intersection(&query).count();
    if matches == 0 {
        return None;
    }
    let m = matches as f64;
    let q = query.len() as f64;
    let i = item.len() as f64;
    Some(0.7 * (m / q) + 0.3 * (m / (i + q - m)))
}

/// Scores keyword hits; the store has already applied the candidate cap.
pub fn keyword_results(hits: Vec<MemoryItem>, query: &SearchQuery) -> Vec<SearchResult> {
    hits.into_iter()
        .filter(|item| matches_filters(item, query))
        .map(|item| SearchResult {
            item,
            score: KEYWORD_SCORE,
        })
        .collect()
}

/// Scores window candidates by cosine similarity, best first.
pub fn vector_results(
    candidates: &[MemoryItem],
    query: &SearchQuery,
    query_embedding: &[f32],
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .iter()
        .filter(|item| matches_filters(item, query))
        .filter_map(|item| {
            let stored = item.embedding.as_deref()?;
            let score = cosine_similarity(query_embedding, stored);
            (score > 0.0).then(|| SearchResult {
                item: item.clone(),
                score,
            })
        })
        .collect();
    sort_by_score(&mut results);
    results
}

/// Scores window candidates by tag overlap, best first.
pub fn tag_results(candidates: &[MemoryItem], query: &SearchQuery) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .iter()
        .filter(|item| matches_filters(item, query))
        .filter_map(|item| {
            tag_score(&item.tags, &query.tags).map(|score| SearchResult {
                item: item.clone(),
                score,
            })
        })
        .collect();
    sort_by_score(&mut results);
    results
}

/// First non-empty strategy in priority order vector, tag, keyword.
pub fn select_non_hybrid(
    vector: Vec<SearchResult>,
    tag: Vec<SearchResult>,
    keyword: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut chosen = [vector, tag, keyword]
        .into_iter()
        .find(|set| !set.is_empty())
        .unwrap_or_default();
    chosen.truncate(limit);
    chosen
}

/// Weighted merge by item id, sorted descending and truncated.
pub fn merge_hybrid(
    vector: Vec<SearchResult>,
    tag: Vec<SearchResult>,
    keyword: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut merged: HashMap<i64, SearchResult> = HashMap::new();
    for (set, weight) in [
        (vector, VECTOR_WEIGHT),
        (tag, TAG_WEIGHT),
        (keyword, KEYWORD_WEIGHT),
    ] {
        for hit in set {
            let contribution = hit.score * weight;
            merged
                .entry(hit.item.id)
                .and_modify(|existing| existing.score += contribution)
                .or_insert(SearchResult {
                    item: hit.item,
                    score: contribution,
                });
        }
    }
    let mut results: Vec<SearchResult> = merged.into_values().collect();
    sort_by_score(&mut results);
    results.truncate(limit);
    results
}

/// Descending by score; ties go to the newer item.
fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.item.id.cmp(&a.item.id))
    });
}
