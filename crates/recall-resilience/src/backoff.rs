// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff schedule with jitter.

use std::time::Duration;

use rand::Rng;
use recall_config::model::RetryConfig;

/// Delay schedule and stopping rules for a retried operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Growth factor applied after each retry.
    pub multiplier: f64,
    /// Upper bound for a single delay.
    pub max_interval: Duration,
    /// Jitter as a fraction of the delay (0.2 = ±20%).
    pub randomization_factor: f64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Wall-clock ceiling across all attempts and sleeps.
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            multiplier: config.multiplier,
            max_interval: Duration::from_millis(config.max_interval_ms),
            randomization_factor: config.randomization_factor,
            max_attempts: config.max_attempts,
            max_elapsed: Duration::from_secs(config.max_elapsed_secs),
        }
    }
}

impl BackoffPolicy {
    /// A policy with no sleeping, for tests that exercise retry counts only.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_interval: Duration::ZERO,
            multiplier: 1.0,
            max_interval: Duration::ZERO,
            randomization_factor: 0.0,
            max_attempts,
            max_elapsed: Duration::from_secs(60),
        }
    }

    /// Un-jittered delay before retry number `retry_index` (0-based).
    pub fn base_interval(&self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let scaled = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_interval.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_interval)
    }

    /// Jittered delay before retry number `retry_index`, never above `max_interval`.
    pub fn interval(&self, retry_index: u32) -> Duration {
        self.jitter(self.base_interval(retry_index))
    }

    /// Delay to use when the server supplied a retry-after hint.
    pub fn hinted_interval(&self, hint: Duration) -> Duration {
        hint.min(self.max_interval)
    }

    fn jitter(&self, base: Duration) -> Duration {
        if self.randomization_factor <= 0.0 || base.is_zero() {
            return base;
        }
        let secs = base.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));
        Duration::try_from_secs_f64(jittered.max(0.0))
            .unwrap_or(base)
            .min(self.max_interval)
    }
}
