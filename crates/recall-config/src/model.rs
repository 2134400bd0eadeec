// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Recall memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error instead of a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Top-level Recall configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Hosted text-completion API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Memory store and retrieval tuning.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Personal-memory normalization model settings.
    #[serde(default)]
    pub normalizer: CompletionConfig,

    /// Episode summarization model settings.
    #[serde(default = "default_summarizer")]
    pub summarizer: CompletionConfig,

    /// Transport retry policy for hosted model calls.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            storage: StorageConfig::default(),
            anthropic: AnthropicConfig::default(),
            memory: MemoryConfig::default(),
            normalizer: CompletionConfig::default(),
            summarizer: default_summarizer(),
            retry: RetryConfig::default(),
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("memory.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("memory.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Hosted text-completion API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Override for the Messages endpoint (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            base_url: None,
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// Memory store and retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Number of most-recent rows scanned by the vector and tag strategies.
    #[serde(default = "default_candidate_window")]
    pub candidate_window: usize,

    /// Keyword candidates fetched per requested result.
    #[serde(default = "default_keyword_candidate_multiplier")]
    pub keyword_candidate_multiplier: usize,

    /// Result cap used when a query does not set one.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    /// How far back reflection looks for episodes, in days.
    #[serde(default = "default_reflection_window_days")]
    pub reflection_window_days: i64,

    /// Minimum seconds between automatic reflections of one thread.
    #[serde(default = "default_reflect_min_interval_secs")]
    pub reflect_min_interval_secs: u64,

    /// Embedding endpoint settings. No endpoint disables embeddings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            candidate_window: default_candidate_window(),
            keyword_candidate_multiplier: default_keyword_candidate_multiplier(),
            default_search_limit: default_search_limit(),
            reflection_window_days: default_reflection_window_days(),
            reflect_min_interval_secs: default_reflect_min_interval_secs(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

fn default_candidate_window() -> usize {
    500
}

fn default_keyword_candidate_multiplier() -> usize {
    3
}

fn default_search_limit() -> usize {
    10
}

/// Longest accepted reflection window (about a century).
pub const MAX_REFLECTION_WINDOW_DAYS: i64 = 36_500;

fn default_reflection_window_days() -> i64 {
    7
}

fn default_reflect_min_interval_secs() -> u64 {
    3600
}

/// OpenAI-compatible embedding endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Full URL of the embeddings endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Embedding model name sent with each request.
    #[serde(default)]
    pub model: Option<String>,

    /// Bearer token for the endpoint.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Settings for one hosted-model caller (normalizer or summarizer).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Model identifier.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Maximum tokens to generate.
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            max_tokens: default_completion_max_tokens(),
            temperature: 0.0,
        }
    }
}

fn default_summarizer() -> CompletionConfig {
    CompletionConfig {
        max_tokens: 1024,
        temperature: 0.2,
        ..CompletionConfig::default()
    }
}

fn default_completion_model() -> String {
    "claude-haiku-4-5-20250901".to_string()
}

fn default_completion_max_tokens() -> u32 {
    512
}

/// Exponential backoff policy for hosted-model calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Growth factor applied after each retry.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound for a single delay in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Jitter as a fraction of the delay (0.2 = ±20%).
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,

    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock ceiling across all attempts, in seconds.
    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval_ms(),
            randomization_factor: default_randomization_factor(),
            max_attempts: default_max_attempts(),
            max_elapsed_secs: default_max_elapsed_secs(),
        }
    }
}

fn default_initial_interval_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_interval_ms() -> u64 {
    60_000
}

fn default_randomization_factor() -> f64 {
    0.2
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_elapsed_secs() -> u64 {
    300
}
