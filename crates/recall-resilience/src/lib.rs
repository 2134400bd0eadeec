// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Recall memory engine.
//!
//! [`BackoffPolicy`] describes an exponential, jittered delay schedule with
//! attempt and wall-clock ceilings; [`retry`] drives any fallible async
//! operation under such a policy. The operation classifies its own failures
//! through [`RetryError`], so the utility knows nothing about HTTP.

pub mod backoff;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use retry::{RetryError, retry};
