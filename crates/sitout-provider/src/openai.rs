//! Provider for any OpenAI-style `/chat/completions` endpoint.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use sitout_config::ProviderConfig;
use sitout_core::{GenerationProvider, GenerationRequest, ProviderError};
use tracing::debug;

use crate::http::{build_client, status_error, transport_error};

#[derive(Debug)]
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.resolved_base_url(),
            model: config.model.clone(),
            client: build_client(config.timeout())?,
        })
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if !request.system.trim().is_empty() {
            messages.push(json!({"role": "system", "content": request.system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, %url, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|err| transport_error("openai-compat", err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error("openai-compat", err))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }
        parse_completion_content(&body)
    }
}

fn parse_completion_content(body: &str) -> Result<String, ProviderError> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        ProviderError::transport(format!("failed to parse completion response JSON: {err}"))
    })?;
    value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::transport("missing choices[0].message.content in completion response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitout_config::ProviderKind;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(&ProviderConfig {
            kind: ProviderKind::OpenaiCompat,
            model: "gpt-4o-mini".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_messages() {
        let body = provider().request_body(&GenerationRequest {
            system: "You are Chakko.".into(),
            prompt: "Reply".into(),
            temperature: 0.5,
        });
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Reply");
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn test_request_body_without_system() {
        let body = provider().request_body(&GenerationRequest {
            system: String::new(),
            prompt: "Reply".into(),
            temperature: 0.5,
        });
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_completion_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Sheri, sheri."}}]}"#;
        assert_eq!(parse_completion_content(body).unwrap(), "Sheri, sheri.");
    }

    #[test]
    fn test_parse_completion_missing_content() {
        let err = parse_completion_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.message.contains("choices[0]"));
    }
}
