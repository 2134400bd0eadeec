// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-output episode summarizer.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use recall_core::RecallError;
use recall_memory::{EpisodeSummarizer, MemoryItem};

pub struct MockSummarizer {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockSummarizer {
    /// Always summarizes to `text`.
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EpisodeSummarizer for MockSummarizer {
    async fn summarize_episodes(&self, _episodes: &[MemoryItem]) -> Result<String, RecallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(RecallError::provider)
    }
}
