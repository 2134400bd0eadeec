// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-completion provider trait.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a hosted text-completion model.
///
/// Implementations own their transport retry policy; callers see either a
/// final response or a terminal error.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Sends one completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, RecallError>;
}
