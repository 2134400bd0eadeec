// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-backed [`EpisodeSummarizer`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use recall_config::model::CompletionConfig;
use recall_core::{ProviderAdapter, ProviderMessage, ProviderRequest, RecallError};
use tracing::debug;

use crate::reflection::EpisodeSummarizer;
use crate::types::MemoryItem;

const SUMMARY_SYSTEM_PROMPT: &str = "\
You consolidate an assistant's episodic notes into long-term memory.
You receive a chronological list of episodes, one per line, each prefixed with its timestamp.
Write a concise summary in the third person (\"The user ...\") that keeps only durable facts:
preferences, decisions, commitments, recurring needs and outcomes that will still matter later.
Exclude transient chatter, tool errors, retries, failures and anything that was later corrected.
Never include credentials, API keys, tokens or passwords.
Reply with the summary text only, no preamble and no bullet headers.";

/// Summarizes episodes through a hosted completion model.
pub struct LlmEpisodeSummarizer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmEpisodeSummarizer {
    pub fn new(provider: Arc<dyn ProviderAdapter>, settings: &CompletionConfig) -> Self {
        Self {
            provider,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

/// One `[timestamp] content` line per episode, in the given order.
pub fn format_episodes(episodes: &[MemoryItem]) -> String {
    episodes
        .iter()
        .map(|e| {
            format!(
                "[{}] {}",
                e.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                e.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl EpisodeSummarizer for LlmEpisodeSummarizer {
    async fn summarize_episodes(&self, episodes: &[MemoryItem]) -> Result<String, RecallError> {
        if episodes.is_empty() {
            return Err(RecallError::Validation("no episodes to summarize".into()));
        }
        if self.model.trim().is_empty() {
            return Err(RecallError::Config("summarizer model must not be empty".into()));
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(SUMMARY_SYSTEM_PROMPT.to_string()),
            messages: vec![ProviderMessage::user(format_episodes(episodes))],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.complete(request).await?;

        let summary = response.text.trim();
        if summary.is_empty() {
            return Err(RecallError::provider("summarizer returned an empty summary"));
        }
        debug!(
            episodes = episodes.len(),
            chars = summary.len(),
            "episodes summarized"
        );
        Ok(summary.to_string())
    }
}
