//! Configuration loading and validation (`~/.config/sitout/config.toml`).

pub mod config;
pub mod credentials;
pub mod paths;
pub mod personas;
pub mod validate;

pub use config::{
    CONFIG_ENV_VAR, ConversationConfig, ProviderConfig, ProviderKind, RateLimitConfig,
    SitoutConfig, SpeechConfig,
};
pub use credentials::{CredentialsConfig, KeyRejection, check_key_format, mask_secret};
pub use personas::builtin_personas;
pub use validate::validate_config;
