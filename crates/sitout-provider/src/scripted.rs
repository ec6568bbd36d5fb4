//! Offline provider with canned behavior, for `--offline` runs and tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sitout_core::{GenerationProvider, GenerationRequest, ProviderError};

/// Answers from a script, then repeats a final outcome forever.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    then: Result<String, ProviderError>,
}

impl ScriptedProvider {
    /// Every call returns `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::sequence(Vec::new(), Ok(text.into()))
    }

    /// Every call fails, so callers always fall back.
    pub fn always_failing() -> Self {
        Self::sequence(
            Vec::new(),
            Err(ProviderError::transport("offline: no provider configured")),
        )
    }

    pub fn sequence(
        script: Vec<Result<String, ProviderError>>,
        then: Result<String, ProviderError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            then,
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _credential: &str,
        _request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or_else(|| self.then.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: String::new(),
            prompt: "hi".into(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_fixed_reply() {
        let provider = ScriptedProvider::fixed("ok");
        assert_eq!(provider.generate("k", &request()).await.unwrap(), "ok");
        assert_eq!(provider.generate("k", &request()).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_always_failing() {
        let provider = ScriptedProvider::always_failing();
        let err = provider.generate("k", &request()).await.unwrap_err();
        assert!(err.status.is_none());
    }

    #[tokio::test]
    async fn test_sequence_then_repeat() {
        let provider = ScriptedProvider::sequence(
            vec![
                Err(ProviderError::new(Some(429), "slow down")),
                Ok("first".into()),
            ],
            Ok("rest".into()),
        );
        assert_eq!(
            provider.generate("k", &request()).await.unwrap_err().status,
            Some(429)
        );
        assert_eq!(provider.generate("k", &request()).await.unwrap(), "first");
        assert_eq!(provider.generate("k", &request()).await.unwrap(), "rest");
        assert_eq!(provider.generate("k", &request()).await.unwrap(), "rest");
    }
}
