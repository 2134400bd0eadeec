// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use recall_core::{
    EmbeddingAdapter, ProviderAdapter, ProviderRequest, ProviderResponse, RecallError,
};

use crate::reflection::EpisodeSummarizer;
use crate::types::MemoryItem;

const VOCABULARY: [&str; 8] = ["ruby", "python", "rust", "tea", "coffee", "train", "lisbon", "deploy"];

/// One dimension per vocabulary word; unknown words contribute nothing.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingAdapter for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|w| lower.split(|c: char| !c.is_alphanumeric()).filter(|t| t == w).count() as f32)
            .collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingAdapter for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RecallError> {
        Err(RecallError::provider("embedding service unavailable"))
    }
}

/// Returns a fixed summary (or error) and records what it was shown.
pub struct StaticSummarizer {
    reply: Result<String, String>,
    seen: Mutex<Vec<String>>,
}

impl StaticSummarizer {
    pub fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EpisodeSummarizer for StaticSummarizer {
    async fn summarize_episodes(&self, episodes: &[MemoryItem]) -> Result<String, RecallError> {
        self.seen
            .lock()
            .unwrap()
            .extend(episodes.iter().map(|e| e.content.clone()));
        self.reply.clone().map_err(RecallError::provider)
    }
}

/// Replies from a FIFO queue and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, RecallError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, RecallError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RecallError::provider("no scripted reply left")))?;
        Ok(ProviderResponse {
            text,
            model,
            usage: None,
        })
    }
}
