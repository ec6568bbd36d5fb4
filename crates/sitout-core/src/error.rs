use serde::Serialize;

/// How a failed provider call is treated by credential rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Provider signaled throttling or overload. Retrying now won't help.
    RateLimited,
    /// Credential rejected. Penalized until an explicit reset.
    AuthOrInvalid,
    /// Transport errors, 5xx, unparseable or empty responses.
    Unknown,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate-limited"),
            Self::AuthOrInvalid => write!(f, "auth-or-invalid"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Error returned by a generation provider for a single call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", display_provider_error(.status, .message))]
pub struct ProviderError {
    /// HTTP status, when the provider answered at all.
    pub status: Option<u16>,
    pub message: String,
}

fn display_provider_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("provider returned {code}: {message}"),
        None => format!("provider call failed: {message}"),
    }
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// Why a generation request produced no text. Always absorbed by falling back.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("Local rate limiter denied the call (next slot in {wait_ms} ms)")]
    Throttled { wait_ms: u64 },

    #[error("Provider throttled credential {credential}: {message}")]
    ProviderThrottled { credential: String, message: String },

    #[error("No credential available")]
    NoCredentialAvailable,

    #[error("All {attempts} attempt(s) exhausted (last failure: {last})")]
    AllAttemptsExhausted { attempts: u32, last: FailureClass },
}

impl GenerationFailure {
    /// Whether the failure came from throttling, locally or upstream.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Throttled { .. } | Self::ProviderThrottled { .. })
    }
}
