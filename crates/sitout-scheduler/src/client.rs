//! Generation with local rate limiting and multi-credential retry.
//!
//! The client never panics and never surfaces a provider error directly:
//! every outcome is either normalized text or a [`GenerationFailure`] that
//! the turn scheduler absorbs by falling back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Timelike;
use sitout_config::SitoutConfig;
use sitout_core::{
    ConversationHistory, FailureClass, GenerationFailure, GenerationProvider, GenerationRequest,
    Persona, ProviderError,
};
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::credential_pool::{CredentialHandle, CredentialPool, CredentialStatus};
use crate::prompt::{PromptSettings, build_request};
use crate::rate_limit::RateLimiter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientSettings {
    /// Credentials tried per call (capped by healthy credentials).
    pub max_attempts: u32,
    pub prompt: PromptSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            prompt: PromptSettings::default(),
        }
    }
}

impl ClientSettings {
    pub fn from_config(config: &SitoutConfig) -> Self {
        Self {
            max_attempts: config.credentials.max_attempts,
            prompt: PromptSettings {
                context_window: config.conversation.context_window,
                temperature: config.provider.temperature,
                opening_temperature: config.provider.opening_temperature,
            },
        }
    }
}

/// Generates persona lines through a [`GenerationProvider`].
///
/// Owns the credential pool and the rate limiter. Both sit behind std
/// mutexes that are released before any provider call is awaited.
pub struct GenerationClient {
    provider: Arc<dyn GenerationProvider>,
    pool: Mutex<CredentialPool>,
    limiter: Mutex<RateLimiter>,
    settings: ClientSettings,
}

impl GenerationClient {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        pool: CredentialPool,
        limiter: RateLimiter,
        settings: ClientSettings,
    ) -> Self {
        Self {
            provider,
            pool: Mutex::new(pool),
            limiter: Mutex::new(limiter),
            settings,
        }
    }

    /// Build a client from config, resolving credentials from config and env.
    pub fn from_config(provider: Arc<dyn GenerationProvider>, config: &SitoutConfig) -> Self {
        let pool = CredentialPool::new(
            config.resolve_credentials(),
            Duration::from_secs(config.credentials.cooldown_secs),
        );
        Self::new(
            provider,
            pool,
            RateLimiter::from_config(&config.rate_limit),
            ClientSettings::from_config(config),
        )
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate `persona`'s next line, or an opening line for an empty history.
    pub async fn generate(
        &self,
        persona: &Persona,
        history: &ConversationHistory,
    ) -> Result<String, GenerationFailure> {
        let hour = chrono::Local::now().hour();
        self.generate_at_hour(persona, history, hour).await
    }

    pub async fn generate_at_hour(
        &self,
        persona: &Persona,
        history: &ConversationHistory,
        hour: u32,
    ) -> Result<String, GenerationFailure> {
        let request = build_request(persona, history, &self.settings.prompt, hour);
        self.admit()?;

        let budget = (self.settings.max_attempts as usize).min(self.lock_pool().healthy_count());
        if budget == 0 {
            debug!(persona = %persona.id, "No healthy credential; skipping provider");
            self.lock_limiter().record_failure();
            return Err(GenerationFailure::NoCredentialAvailable);
        }

        let mut tried: Vec<CredentialHandle> = Vec::with_capacity(budget);
        let mut last = FailureClass::Unknown;
        let mut attempts = 0u32;

        for _ in 0..budget {
            let (handle, secret) = {
                let mut pool = self.lock_pool();
                match pool.acquire_excluding(&tried) {
                    Ok(handle) => {
                        let secret = pool.secret(&handle).to_string();
                        (handle, secret)
                    }
                    Err(_) => break,
                }
            };
            attempts += 1;
            debug!(
                persona = %persona.id,
                attempt = attempts,
                budget,
                key = %handle.masked(),
                provider = self.provider.name(),
                "Calling provider"
            );

            let (class, detail) = match self.provider.generate(&secret, &request).await {
                Ok(raw) => {
                    let text = normalize_output(&raw, persona);
                    if !text.is_empty() {
                        self.lock_pool().report_success(&handle);
                        self.lock_limiter().record_success();
                        info!(persona = %persona.id, key = %handle.masked(), "Generated line");
                        return Ok(text);
                    }
                    (FailureClass::Unknown, "empty response".to_string())
                }
                Err(error) => (classify(&error), error.to_string()),
            };

            warn!(
                persona = %persona.id,
                key = %handle.masked(),
                class = %class,
                error = %detail,
                "Provider call failed"
            );
            self.lock_pool().report_failure(&handle, class, &detail);
            last = class;

            if class == FailureClass::RateLimited {
                self.lock_limiter().record_failure();
                return Err(GenerationFailure::ProviderThrottled {
                    credential: handle.masked().to_string(),
                    message: detail,
                });
            }
            tried.push(handle);
        }

        self.lock_limiter().record_failure();
        if attempts == 0 {
            return Err(GenerationFailure::NoCredentialAvailable);
        }
        Err(GenerationFailure::AllAttemptsExhausted { attempts, last })
    }

    /// Call the provider with one specific credential, bypassing the limiter.
    ///
    /// Returns `None` when `index` is out of range. The outcome is reported to
    /// the pool so `status()` reflects it.
    pub async fn probe(
        &self,
        index: usize,
        request: &GenerationRequest,
    ) -> Option<Result<String, ProviderError>> {
        let (handle, secret) = {
            let pool = self.lock_pool();
            let handle = pool.handle(index)?;
            let secret = pool.secret(&handle).to_string();
            (handle, secret)
        };
        let result = self.provider.generate(&secret, request).await;
        let mut pool = self.lock_pool();
        match &result {
            Ok(_) => pool.report_success(&handle),
            Err(error) => pool.report_failure(&handle, classify(error), &error.message),
        }
        Some(result)
    }

    pub fn credential_count(&self) -> usize {
        self.lock_pool().len()
    }

    pub fn credential_status(&self) -> Vec<CredentialStatus> {
        self.lock_pool().status()
    }

    pub fn reset_credentials(&self) {
        self.lock_pool().reset_health();
    }

    /// Consult the limiter; stamps the attempt when admitted.
    fn admit(&self) -> Result<(), GenerationFailure> {
        let mut limiter = self.lock_limiter();
        let now = Instant::now();
        if !limiter.try_acquire_at(now) {
            let wait = limiter.remaining_at(now);
            debug!(wait_ms = wait.as_millis() as u64, "Rate limiter denied call");
            return Err(GenerationFailure::Throttled {
                wait_ms: wait.as_millis() as u64,
            });
        }
        limiter.record_attempt_at(now);
        Ok(())
    }

    fn lock_pool(&self) -> MutexGuard<'_, CredentialPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_limiter(&self) -> MutexGuard<'_, RateLimiter> {
        self.limiter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Trim, strip wrapping quotes and drop an echoed `"Name:"` prefix.
pub fn normalize_output(raw: &str, persona: &Persona) -> String {
    let text = strip_quotes(raw.trim());
    let text = strip_quotes(strip_speaker_prefix(text, &persona.display_name));
    text.to_string()
}

fn strip_speaker_prefix<'a>(text: &'a str, name: &str) -> &'a str {
    let head = name.len();
    if name.is_empty() || !text.is_char_boundary(head) || text.len() <= head {
        return text;
    }
    if text[..head].eq_ignore_ascii_case(name) && text[head..].starts_with(':') {
        text[head + 1..].trim_start()
    } else {
        text
    }
}

fn strip_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201C}', '\u{201D}')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            return inner.trim();
        }
    }
    text
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
