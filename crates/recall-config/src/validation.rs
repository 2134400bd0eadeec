// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{MAX_REFLECTION_WINDOW_DAYS, RecallConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let memory = &config.memory;
    if memory.candidate_window == 0 {
        fail("memory.candidate_window must be at least 1".to_string());
    }
    if memory.keyword_candidate_multiplier == 0 {
        fail("memory.keyword_candidate_multiplier must be at least 1".to_string());
    }
    if memory.default_search_limit == 0 {
        fail("memory.default_search_limit must be at least 1".to_string());
    }
    if !(1..=MAX_REFLECTION_WINDOW_DAYS).contains(&memory.reflection_window_days) {
        fail(format!(
            "memory.reflection_window_days must be within 1..={MAX_REFLECTION_WINDOW_DAYS}, got {}",
            memory.reflection_window_days
        ));
    }
    if let Some(endpoint) = &memory.embedding.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            fail(format!(
                "memory.embedding.endpoint `{endpoint}` must be an http(s) URL"
            ));
        }
        if memory.embedding.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            fail("memory.embedding.model is required when an endpoint is set".to_string());
        }
    }

    for (section, completion) in [
        ("normalizer", &config.normalizer),
        ("summarizer", &config.summarizer),
    ] {
        if completion.max_tokens == 0 {
            fail(format!("{section}.max_tokens must be at least 1"));
        }
        if !(0.0..=1.0).contains(&completion.temperature) {
            fail(format!(
                "{section}.temperature must be within 0.0..=1.0, got {}",
                completion.temperature
            ));
        }
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        fail("retry.max_attempts must be at least 1".to_string());
    }
    if retry.multiplier < 1.0 {
        fail(format!("retry.multiplier must be >= 1.0, got {}", retry.multiplier));
    }
    if !(0.0..=1.0).contains(&retry.randomization_factor) {
        fail(format!(
            "retry.randomization_factor must be within 0.0..=1.0, got {}",
            retry.randomization_factor
        ));
    }
    if retry.max_interval_ms < retry.initial_interval_ms {
        fail(format!(
            "retry.max_interval_ms ({}) must be >= retry.initial_interval_ms ({})",
            retry.max_interval_ms, retry.initial_interval_ms
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
