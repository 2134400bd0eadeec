// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of free-form personal statements into structured memories.
//!
//! A hosted model rewrites the statement and proposes a type and tags. Its
//! output is untrusted: the type is coerced into a closed set, tags are
//! sanitized, blank text falls back to the raw input, and secret-looking
//! substrings are redacted before anything is returned.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use recall_config::model::CompletionConfig;
use recall_core::{ProviderAdapter, ProviderMessage, ProviderRequest, RecallError};
use recall_security::redact;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// The memory types a normalized statement may carry.
pub const MEMORY_TYPES: [&str; 7] = [
    "preference",
    "biographical",
    "habit",
    "goal",
    "value",
    "project",
    "other",
];

/// Type used when the model's choice is outside [`MEMORY_TYPES`].
pub const FALLBACK_MEMORY_TYPE: &str = "other";

/// Tag list used when sanitization leaves nothing.
pub const FALLBACK_TAG: &str = "misc";

pub const MAX_TAGS: usize = 8;

const NORMALIZE_SYSTEM_PROMPT: &str = r#"You turn a user's personal statement into one long-term memory.

Respond with a single JSON object and nothing else:
{"normalized": string, "type": string, "tags": [string]}

Rules:
- "normalized": one self-contained sentence in the third person. Begin with "The user" whenever the statement is about the user.
- "type": exactly one of preference, biographical, habit, goal, value, project, other.
- "tags": up to 8 short lowercase keywords using only a-z, 0-9, "_" or "-".
- Never copy passwords, API keys, tokens or other credentials into any field."#;

static TAG_INVALID_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").unwrap());

/// A statement after normalization and contract enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedMemory {
    pub normalized: String,
    #[serde(rename = "type")]
    pub memory_type: String,
    pub tags: Vec<String>,
}

/// Calls the hosted model and enforces the output contract.
pub struct Normalizer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl Normalizer {
    pub fn new(provider: Arc<dyn ProviderAdapter>, settings: &CompletionConfig) -> Self {
        Self {
            provider,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Normalize `raw_text`.
    ///
    /// Blank input or a blank model name fail before any request is made.
    /// Transport retries happen inside the provider.
    pub async fn normalize(&self, raw_text: &str) -> Result<NormalizedMemory, RecallError> {
        if raw_text.trim().is_empty() {
            return Err(RecallError::Validation("text to normalize must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(RecallError::Config("normalizer model must not be empty".into()));
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(NORMALIZE_SYSTEM_PROMPT.to_string()),
            messages: vec![ProviderMessage::user(raw_text.trim())],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.complete(request).await?;
        let output = parse_model_output(&response.text)?;
        let normalized = enforce_contract(raw_text, output);

        debug!(
            memory_type = %normalized.memory_type,
            tags = normalized.tags.len(),
            "statement normalized"
        );
        Ok(normalized)
    }
}

/// Fields as the model produced them, before enforcement.
#[derive(Debug, Default, PartialEq)]
struct ModelOutput {
    normalized: String,
    memory_type: String,
    tags: Vec<String>,
}

/// Extracts the JSON object between the first `{` and the last `}`.
fn parse_model_output(text: &str) -> Result<ModelOutput, RecallError> {
    let unparseable = || {
        warn!(chars = text.len(), "normalizer output was not a JSON object");
        RecallError::provider("normalizer returned unparseable output")
    };
    let start = text.find('{').ok_or_else(unparseable)?;
    let end = text.rfind('}').ok_or_else(unparseable)?;
    if end < start {
        return Err(unparseable());
    }
    let value: Value = serde_json::from_str(&text[start..=end]).map_err(|e| RecallError::Provider {
        message: "normalizer returned unparseable output".into(),
        source: Some(Box::new(e)),
    })?;
    let Value::Object(map) = value else {
        return Err(unparseable());
    };

    let string_field = |key: &str| match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    let tags = match map.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(ModelOutput {
        normalized: string_field("normalized"),
        memory_type: string_field("type"),
        tags,
    })
}

fn enforce_contract(raw_text: &str, output: ModelOutput) -> NormalizedMemory {
    let text = if output.normalized.trim().is_empty() {
        raw_text.trim()
    } else {
        output.normalized.trim()
    };
    let redacted_tags: Vec<String> = sanitize_tags(&output.tags)
        .iter()
        .map(|t| redact(t))
        .collect();
    NormalizedMemory {
        normalized: redact(text),
        memory_type: sanitize_memory_type(&output.memory_type),
        tags: sanitize_tags(&redacted_tags),
    }
}

/// Coerces a model-proposed type into [`MEMORY_TYPES`].
pub fn sanitize_memory_type(raw: &str) -> String {
    let candidate = raw.trim().to_lowercase();
    if MEMORY_TYPES.contains(&candidate.as_str()) {
        candidate
    } else {
        FALLBACK_MEMORY_TYPE.to_string()
    }
}

/// Lowercases one tag and collapses runs outside `[a-z0-9_-]` to `_`.
///
/// Leading and trailing `_` are trimmed, so `"C++"` becomes `"c"` rather
/// than `"c_"`. May return an empty string.
pub fn normalize_tag(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    TAG_INVALID_RUN
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Applies [`normalize_tag`] to each tag, drops empties, dedupes, caps at
/// [`MAX_TAGS`], and falls back to `["misc"]`.
pub fn sanitize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags: Vec<String> = raw
        .iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TAGS)
        .collect();
    if tags.is_empty() {
        tags.push(FALLBACK_TAG.to_string());
    }
    tags
}
