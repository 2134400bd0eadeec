// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding adapter for OpenAI-compatible `/embeddings` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use recall_config::model::EmbeddingConfig;
use recall_core::{EmbeddingAdapter, RecallError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embeds text by POSTing `{model, input}` to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpEmbedder {
    /// Creates an embedder for `endpoint`, sending a bearer token when `api_key` is set.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<&str>,
    ) -> Result<Self, RecallError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                RecallError::Config(format!("invalid embedding API key header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RecallError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// Builds an embedder from `[memory.embedding]`; `None` when no endpoint is set.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Option<Self>, RecallError> {
        let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
            debug!("no embedding endpoint configured; vector search disabled");
            return Ok(None);
        };
        let model = config.model.clone().unwrap_or_default();
        let embedder = Self::new(endpoint, model.clone(), config.api_key.as_deref())?;
        info!(endpoint, model, "HTTP embedder initialized");
        Ok(Some(embedder))
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| RecallError::Provider {
                message: format!("embedding request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecallError::provider(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse =
            response.json().await.map_err(|e| RecallError::Provider {
                message: format!("failed to parse embedding response: {e}"),
                source: Some(Box::new(e)),
            })?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RecallError::provider("embedding response contained no vector"))?;
        debug!(dimensions = vector.len(), "text embedded");
        Ok(vector)
    }
}
