use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use sitout_core::ProviderError;

/// Longest error body echoed into a [`ProviderError`] message.
const MAX_BODY_CHARS: usize = 300;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

/// Map a transport failure (connect, timeout, body read) to a status-less error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    ProviderError::transport(format!("{provider} {kind}: {err}"))
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    /// Gemini: `RESOURCE_EXHAUSTED`; OpenAI-style APIs use `type`.
    #[serde(alias = "type")]
    status: Option<String>,
}

/// Build a [`ProviderError`] from a non-success HTTP response.
///
/// Both Gemini and OpenAI-style APIs wrap failures in `{"error": {...}}`;
/// anything else is kept as a truncated raw body.
pub(crate) fn status_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let message = wrapper.error.message?;
            Some(match wrapper.error.status.filter(|s| !s.is_empty()) {
                Some(kind) => format!("{kind}: {message}"),
                None => message,
            })
        })
        .unwrap_or_else(|| truncate(body.trim()));
    ProviderError::new(Some(status), message)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_BODY_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_error_wrapper() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = status_error(429, body);
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "RESOURCE_EXHAUSTED: Quota exceeded");
    }

    #[test]
    fn test_openai_error_wrapper() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = status_error(401, body);
        assert_eq!(
            err.message,
            "invalid_request_error: Incorrect API key provided"
        );
    }

    #[test]
    fn test_plain_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = status_error(500, &body);
        assert_eq!(err.message.len(), MAX_BODY_CHARS + 3);
        assert!(err.message.ends_with("..."));
    }

    #[test]
    fn test_wrapper_without_message_uses_body() {
        let err = status_error(503, r#"{"error":{}}"#);
        assert_eq!(err.message, r#"{"error":{}}"#);
    }
}
