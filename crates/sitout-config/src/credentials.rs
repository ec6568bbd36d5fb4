//! Provider credential discovery and format checks.
//!
//! Keys come from `[credentials].keys` first, then from numbered environment
//! variables (`{env_prefix}1` ..= `{env_prefix}9`). Order is preserved and
//! duplicates are dropped.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Highest numbered env var probed (`SITOUT_API_KEY_9`).
pub const MAX_ENV_KEYS: usize = 9;

const DEFAULT_ENV_PREFIX: &str = "SITOUT_API_KEY_";
const DEFAULT_MIN_LENGTH: usize = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_COOLDOWN_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Maximum credentials tried within one generation call.
    pub max_attempts: u32,
    /// Window after which rate-limited credentials are forgiven.
    pub cooldown_secs: u64,
    pub env_prefix: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    /// Required key prefix. Unset means the provider default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_prefix: Option<String>,
    pub min_length: usize,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            keys: Vec::new(),
            require_prefix: None,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

/// Why a configured key was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRejection {
    Empty,
    WrongPrefix { expected: String },
    TooShort { min: usize, actual: usize },
}

impl std::fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "key is empty"),
            Self::WrongPrefix { expected } => write!(f, "key should start with \"{expected}\""),
            Self::TooShort { min, actual } => {
                write!(f, "key too short ({actual} chars, expected at least {min})")
            }
        }
    }
}

/// Show only the first 8 characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{visible}...")
}

/// Check a key against the configured format rules.
pub fn check_key_format(
    key: &str,
    prefix: Option<&str>,
    min_length: usize,
) -> Result<(), KeyRejection> {
    if key.is_empty() {
        return Err(KeyRejection::Empty);
    }
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        if !key.starts_with(prefix) {
            return Err(KeyRejection::WrongPrefix {
                expected: prefix.to_string(),
            });
        }
    }
    let actual = key.chars().count();
    if actual < min_length {
        return Err(KeyRejection::TooShort {
            min: min_length,
            actual,
        });
    }
    Ok(())
}

impl CredentialsConfig {
    /// Resolve keys from config and the process environment.
    pub fn resolve(&self, default_prefix: Option<&str>) -> Vec<String> {
        self.resolve_with(default_prefix, |name| std::env::var(name).ok())
    }

    /// Resolve keys using `lookup` for environment access.
    pub fn resolve_with<F>(&self, default_prefix: Option<&str>, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = self.require_prefix.as_deref().or(default_prefix);

        let from_env = (1..=MAX_ENV_KEYS)
            .filter_map(|i| lookup(&format!("{}{}", self.env_prefix, i)));

        let mut accepted: Vec<String> = Vec::new();
        let mut total = 0usize;
        for raw in self.keys.iter().cloned().chain(from_env) {
            let key = raw.trim().to_string();
            total += 1;
            if accepted.contains(&key) {
                continue;
            }
            match check_key_format(&key, prefix, self.min_length) {
                Ok(()) => accepted.push(key),
                Err(reason) => {
                    warn!(key = %mask_secret(&key), %reason, "Dropping invalid credential");
                }
            }
        }

        if total > 0 {
            info!(valid = accepted.len(), total, "Resolved provider credentials");
        }
        accepted
    }
}
