//! Conversation engine: credential rotation, rate limiting, generation with
//! retry, fallback selection and the turn-taking state machine.

pub mod classify;
pub mod client;
pub mod credential_pool;
pub mod fallback;
pub mod prompt;
pub mod rate_limit;
pub mod turn;

#[cfg(test)]
mod test_support;

pub use classify::classify;
pub use client::{ClientSettings, GenerationClient, normalize_output};
pub use credential_pool::{
    CredentialHandle, CredentialHealth, CredentialPool, CredentialStatus, DEFAULT_COOLDOWN,
};
pub use fallback::{FallbackSelector, GENERIC_LINES};
pub use prompt::{Mood, PromptSettings, TimeOfDay, build_request};
pub use rate_limit::RateLimiter;
pub use turn::{
    ConversationSnapshot, Phase, SkipReason, TurnOutcome, TurnScheduler, TurnSettings,
};
