//! Generation providers: Gemini, OpenAI-compatible chat completions and an
//! offline scripted provider.

mod gemini;
mod http;
mod openai;
mod scripted;

use std::sync::Arc;

use anyhow::Result;
use sitout_config::{ProviderConfig, ProviderKind};
use sitout_core::GenerationProvider;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;

/// Build the provider selected by `[provider].kind`.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn GenerationProvider>> {
    let provider: Arc<dyn GenerationProvider> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)?),
        ProviderKind::OpenaiCompat => Arc::new(OpenAiCompatProvider::new(config)?),
        ProviderKind::Offline => Arc::new(ScriptedProvider::always_failing()),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_by_kind() {
        for (kind, name) in [
            (ProviderKind::Gemini, "gemini"),
            (ProviderKind::OpenaiCompat, "openai-compat"),
            (ProviderKind::Offline, "scripted"),
        ] {
            let config = ProviderConfig {
                kind,
                ..Default::default()
            };
            assert_eq!(build_provider(&config).unwrap().name(), name);
        }
    }
}
