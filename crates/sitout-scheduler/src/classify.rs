//! Failure classification for provider errors (throttling vs bad credential).

use sitout_core::{FailureClass, ProviderError};

/// Status codes that mean "slow down" rather than "this key is bad".
const THROTTLE_STATUSES: &[u16] = &[429, 503, 529];
const AUTH_STATUSES: &[u16] = &[401, 403];

const THROTTLE_PATTERNS: &[&str] = &[
    "429",
    "too many requests",
    "resource_exhausted",
    "resource exhausted",
    "quota",
    "rate limit",
    "rate_limit",
    "overloaded",
];

/// Key-specific only: a generic `INVALID_ARGUMENT` 400 must not retire a key.
const AUTH_PATTERNS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "invalid_api_key",
    "invalid api key",
    "incorrect api key",
    "api key expired",
    "unauthorized",
    "unauthenticated",
    "permission_denied",
];

/// Classify a provider error.
///
/// Status codes take precedence; otherwise the message is matched
/// case-insensitively, throttling patterns before auth patterns.
pub fn classify(error: &ProviderError) -> FailureClass {
    if let Some(status) = error.status {
        if THROTTLE_STATUSES.contains(&status) {
            return FailureClass::RateLimited;
        }
        if AUTH_STATUSES.contains(&status) {
            return FailureClass::AuthOrInvalid;
        }
    }

    let message = error.message.to_lowercase();
    if matched_pattern(&message, THROTTLE_PATTERNS).is_some() {
        return FailureClass::RateLimited;
    }
    if matched_pattern(&message, AUTH_PATTERNS).is_some() {
        return FailureClass::AuthOrInvalid;
    }
    FailureClass::Unknown
}

fn matched_pattern(haystack: &str, patterns: &'static [&'static str]) -> Option<&'static str> {
    patterns.iter().copied().find(|p| haystack.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(status: Option<u16>, message: &str) -> ProviderError {
        ProviderError::new(status, message)
    }

    #[test]
    fn test_status_429_is_rate_limited() {
        assert_eq!(classify(&err(Some(429), "")), FailureClass::RateLimited);
    }

    #[test]
    fn test_overloaded_statuses_are_rate_limited() {
        assert_eq!(classify(&err(Some(503), "")), FailureClass::RateLimited);
        assert_eq!(classify(&err(Some(529), "")), FailureClass::RateLimited);
    }

    #[test]
    fn test_status_401_403_are_auth() {
        assert_eq!(classify(&err(Some(401), "")), FailureClass::AuthOrInvalid);
        assert_eq!(classify(&err(Some(403), "")), FailureClass::AuthOrInvalid);
    }

    #[test]
    fn test_gemini_resource_exhausted_message() {
        let e = err(Some(400), "RESOURCE_EXHAUSTED: Quota exceeded for metric");
        assert_eq!(classify(&e), FailureClass::RateLimited);
    }

    #[test]
    fn test_gemini_invalid_key_message() {
        let e = err(
            Some(400),
            "INVALID_ARGUMENT: API key not valid. Please pass a valid API key.",
        );
        assert_eq!(classify(&e), FailureClass::AuthOrInvalid);
    }

    #[test]
    fn test_transport_message_patterns() {
        assert_eq!(
            classify(&err(None, "HTTP 429 Too Many Requests")),
            FailureClass::RateLimited
        );
        assert_eq!(
            classify(&err(None, "Unauthorized request")),
            FailureClass::AuthOrInvalid
        );
    }

    #[test]
    fn test_throttle_patterns_win_over_auth_patterns() {
        // "invalid" appears, but the provider is throttling.
        let e = err(None, "rate limit hit; invalid retry window");
        assert_eq!(classify(&e), FailureClass::RateLimited);
    }

    #[test]
    fn test_generic_bad_request_is_unknown() {
        let e = err(
            Some(400),
            "INVALID_ARGUMENT: Request contains an invalid argument.",
        );
        assert_eq!(classify(&e), FailureClass::Unknown);

        let e = err(
            Some(400),
            "invalid_request_error: This model's maximum context length is 8192 tokens.",
        );
        assert_eq!(classify(&e), FailureClass::Unknown);
    }

    #[test]
    fn test_openai_bad_key_message() {
        let e = err(
            Some(400),
            "invalid_request_error: Incorrect API key provided: sk-abc.",
        );
        assert_eq!(classify(&e), FailureClass::AuthOrInvalid);
    }

    #[test]
    fn test_unknown_errors() {
        assert_eq!(
            classify(&err(Some(500), "internal error")),
            FailureClass::Unknown
        );
        assert_eq!(
            classify(&err(None, "connection reset by peer")),
            FailureClass::Unknown
        );
        assert_eq!(classify(&err(None, "")), FailureClass::Unknown);
    }
}
