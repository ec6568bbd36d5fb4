//! Google Generative Language `generateContent` provider.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitout_config::ProviderConfig;
use sitout_core::{GenerationProvider, GenerationRequest, ProviderError};
use tracing::debug;

use crate::http::{build_client, status_error, transport_error};

#[derive(Debug)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.resolved_base_url(),
            model: config.model.clone(),
            client: build_client(config.timeout())?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        let body = GenerateContentRequest::from(request);
        debug!(model = %self.model, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error("gemini", err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error("gemini", err))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }
        parse_response(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let system_instruction = (!request.system.trim().is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: request.system.clone(),
            }],
        });
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|err| {
        ProviderError::transport(format!("failed to parse Gemini response: {err}"))
    })?;
    let text: String = parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::transport(
            "Gemini returned no text in the response candidates",
        ));
    }
    Ok(text)
}
