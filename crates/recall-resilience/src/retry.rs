// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic retry loop driven by a [`BackoffPolicy`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;

/// How a failed attempt should be treated.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Retrying cannot help (bad request, auth failure, malformed payload).
    Permanent(E),
    /// The attempt may succeed later; `retry_after` carries a server hint.
    Transient {
        error: E,
        retry_after: Option<Duration>,
    },
}

impl<E> RetryError<E> {
    /// A failure that must not be retried.
    pub fn permanent(error: E) -> Self {
        RetryError::Permanent(error)
    }

    /// A retryable failure with no server hint.
    pub fn transient(error: E) -> Self {
        RetryError::Transient {
            error,
            retry_after: None,
        }
    }

    /// A retryable failure carrying the server's retry-after hint.
    pub fn rate_limited(error: E, retry_after: Option<Duration>) -> Self {
        RetryError::Transient { error, retry_after }
    }

    /// Discard the classification.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent(error) | RetryError::Transient { error, .. } => error,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy gives up.
///
/// The elapsed-time ceiling is measured from the first attempt and is
/// independent of any timeout the caller wraps around this future; a sleep
/// that would cross the ceiling is not started and the last error is
/// returned instead.
pub async fn retry<T, E, F, Fut>(policy: &BackoffPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let (error, retry_after) = match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(RetryError::Permanent(error)) => {
                debug!(operation, attempt, %error, "permanent failure");
                return Err(error);
            }
            Err(RetryError::Transient { error, retry_after }) => (error, retry_after),
        };

        if attempt >= policy.max_attempts {
            warn!(operation, attempt, %error, "retry attempts exhausted");
            return Err(error);
        }

        let delay = match retry_after {
            Some(hint) => policy.hinted_interval(hint),
            None => policy.interval(attempt - 1),
        };
        if started.elapsed() + delay > policy.max_elapsed {
            warn!(
                operation,
                attempt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                %error,
                "retry time budget exhausted"
            );
            return Err(error);
        }

        warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            %error,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
