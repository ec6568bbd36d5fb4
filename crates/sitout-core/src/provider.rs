//! Boundary to the external text-generation provider.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;

/// A single generation call: system profile, prompt body and sampling temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Text-generation backend called with one credential per attempt.
///
/// Implementations must map every failure (transport, HTTP status, parse)
/// into a [`ProviderError`] so the caller can classify it.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short name used in logs (e.g. `gemini`).
    fn name(&self) -> &str;

    async fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError>;
}
