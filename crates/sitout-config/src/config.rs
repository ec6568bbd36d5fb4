use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sitout_core::Persona;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::CredentialsConfig;
use crate::paths;
use crate::personas::builtin_personas;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "SITOUT_CONFIG";

/// Conversation pacing and history bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Messages retained in history (oldest dropped first).
    pub retention: usize,
    /// History length at which automatic progression pauses.
    pub soft_cap: usize,
    /// Recent messages included in each prompt.
    pub context_window: usize,
    pub dwell_min_ms: u64,
    pub dwell_max_ms: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            retention: 10,
            soft_cap: 10,
            context_window: 5,
            dwell_min_ms: 8_000,
            dwell_max_ms: 12_000,
        }
    }
}

impl ConversationConfig {
    pub fn dwell_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.dwell_min_ms),
            Duration::from_millis(self.dwell_max_ms),
        )
    }
}

/// Outbound call spacing with exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub base_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 10_000,
            max_interval_ms: 120_000,
        }
    }
}

impl RateLimitConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Google Generative Language `generateContent`.
    #[default]
    Gemini,
    /// Any `/chat/completions` endpoint.
    OpenaiCompat,
    /// No network; every call fails and fallback lines are used.
    Offline,
}

impl ProviderKind {
    /// Key prefix enforced when `[credentials].require_prefix` is unset.
    pub fn default_key_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("AIza"),
            Self::OpenaiCompat | Self::Offline => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenaiCompat => "https://api.openai.com/v1",
            Self::Offline => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenaiCompat => "openai-compat",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    /// Unset means the provider default endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub temperature: f32,
    /// Temperature for the opening line (more varied).
    pub opening_temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            temperature: 0.8,
            opening_temperature: 0.9,
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.kind.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// TTS command (e.g. `espeak-ng`). Empty disables playback.
    pub command: String,
}

impl SpeechConfig {
    pub fn is_enabled(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitoutConfig {
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Speaking order. Empty means the built-in cast.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<Persona>,
}

impl SitoutConfig {
    /// Load configuration.
    ///
    /// Lookup order: `explicit` -> `$SITOUT_CONFIG` -> user config dir.
    /// Explicit and env-provided paths must exist; a missing user config
    /// yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Self::load_from_path(Path::new(&path));
        }
        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse a config file that must exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The file `load` would read: `explicit`, then `$SITOUT_CONFIG`, then
    /// the user config path (which may not exist).
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        Self::user_config_path()
    }

    /// Path of the user-level config file, if a home directory is known.
    pub fn user_config_path() -> Option<PathBuf> {
        paths::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Personas in speaking order.
    pub fn personas(&self) -> Vec<Persona> {
        if self.personas.is_empty() {
            builtin_personas()
        } else {
            self.personas.clone()
        }
    }

    /// Credentials from config and environment, format-checked for the provider.
    pub fn resolve_credentials(&self) -> Vec<String> {
        self.credentials
            .resolve(self.provider.kind.default_key_prefix())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Default config TOML with comments, written by `sitout config init`.
    pub fn default_template() -> String {
        r#"# sitout configuration
#
# Every section is optional; omitted keys use the defaults shown here.

[conversation]
retention = 10          # messages kept in history (oldest dropped first)
soft_cap = 10           # pause automatic turns at this history length (<= retention)
context_window = 5      # recent messages included in each prompt
dwell_min_ms = 8000     # pause between turns is drawn from [min, max]
dwell_max_ms = 12000

[rate_limit]
base_interval_ms = 10000   # minimum spacing between provider calls
max_interval_ms = 120000   # backoff ceiling (base * 2^failures)

[credentials]
max_attempts = 3           # credentials tried per generation call
cooldown_secs = 300        # rate-limited keys are forgiven after this window
env_prefix = "SITOUT_API_KEY_"   # reads SITOUT_API_KEY_1 ..= SITOUT_API_KEY_9
# keys = ["AIza..."]
# require_prefix = "AIza"  # defaults to "AIza" for gemini
min_length = 30

[provider]
kind = "gemini"            # gemini | openai-compat | offline
model = "gemini-1.5-flash"
# base_url = "https://generativelanguage.googleapis.com/v1beta"
temperature = 0.8
opening_temperature = 0.9
timeout_secs = 30

[speech]
command = ""               # e.g. "espeak-ng"; empty disables playback

# Personas default to the built-in cast. Define [[personas]] to replace it:
#
# [[personas]]
# id = "babu"
# display_name = "Babu"
# prompt_profile = "You are Babu, a philosophical farmer from Kerala."
# fallback_lines = ["Nature never hurries, yet everything is accomplished in time, machane."]
# [personas.voice]
# name = "en-gb+m3"
# pitch = 1.1
# rate = 0.9
"#
        .to_string()
    }

    /// Write the default template to the user config path.
    /// Returns the path where the file was written.
    pub fn save_default_template() -> Result<PathBuf> {
        let path = Self::user_config_path().context("Failed to determine config directory")?;
        Self::save_template_to(&path)?;
        Ok(path)
    }

    pub fn save_template_to(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(path, Self::default_template())
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
