// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API provider for the Recall memory engine.
//!
//! [`AnthropicProvider`] implements [`ProviderAdapter`] on top of
//! [`AnthropicClient`]. The normalizer and the episode summarizer both talk
//! to the hosted model through it.

pub mod client;
pub mod types;

use async_trait::async_trait;
use recall_config::model::RecallConfig;
use recall_core::{ProviderAdapter, ProviderRequest, ProviderResponse, RecallError, TokenUsage};
use recall_resilience::BackoffPolicy;
use tracing::{debug, info};

pub use client::AnthropicClient;
use types::{ApiMessage, MessageRequest};

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic-backed [`ProviderAdapter`].
///
/// Construction never fails on a missing key; the provider is built in a
/// keyless state and every [`complete`](ProviderAdapter::complete) call then
/// returns [`RecallError::Config`] without touching the network.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Option<AnthropicClient>,
}

impl AnthropicProvider {
    /// Creates a provider from the `[anthropic]` and `[retry]` config sections.
    ///
    /// # API Key Resolution
    /// 1. `config.anthropic.api_key` if set and non-blank
    /// 2. `ANTHROPIC_API_KEY` environment variable
    /// 3. Otherwise the provider is keyless
    pub fn from_config(config: &RecallConfig, default_model: &str) -> Result<Self, RecallError> {
        let api_key = resolve_api_key(
            config.anthropic.api_key.as_deref(),
            std::env::var(API_KEY_ENV).ok(),
        );
        let Some(api_key) = api_key else {
            debug!("no Anthropic API key configured; provider is keyless");
            return Ok(Self { client: None });
        };

        let mut client = AnthropicClient::new(
            api_key,
            config.anthropic.api_version.clone(),
            default_model.to_string(),
        )?
        .with_retry_policy(BackoffPolicy::from(&config.retry));
        if let Some(url) = &config.anthropic.base_url {
            client = client.with_base_url(url.clone());
        }

        info!(model = default_model, "Anthropic provider initialized");
        Ok(Self {
            client: Some(client),
        })
    }

    /// Creates a provider over an existing client.
    pub fn with_client(client: AnthropicClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.client.is_some()
    }

    fn to_message_request(client: &AnthropicClient, request: &ProviderRequest) -> MessageRequest {
        let model = if request.model.trim().is_empty() {
            client.default_model().to_string()
        } else {
            request.model.clone()
        };
        MessageRequest {
            model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError> {
        let Some(client) = &self.client else {
            return Err(RecallError::Config(format!(
                "Anthropic API key is not configured (set anthropic.api_key or {API_KEY_ENV})"
            )));
        };

        let api_request = Self::to_message_request(client, &request);
        let response = client.complete_message(&api_request).await?;

        Ok(ProviderResponse {
            text: response.text(),
            model: response.model.clone(),
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

/// Picks the configured key, falling back to the environment; blank keys count as absent.
fn resolve_api_key(configured: Option<&str>, env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env.filter(|k| !k.trim().is_empty()))
}
