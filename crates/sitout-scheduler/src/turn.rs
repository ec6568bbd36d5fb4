//! Turn-taking state machine.
//!
//! `Idle -> Active -> Paused <-> Active`, with `reset()` returning to `Idle`
//! from anywhere. Every requested turn that runs appends exactly one message
//! and advances the speaker, whether the line was generated or a fallback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::Timelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sitout_config::SitoutConfig;
use sitout_core::{
    ConversationHistory, Message, MessageSource, NullSpeech, Persona, PersonaId, SpeechSink,
};
use tracing::{debug, info, warn};

use crate::client::GenerationClient;
use crate::fallback::FallbackSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    pub retention: usize,
    /// History length at which automatic progression pauses.
    pub soft_cap: usize,
    pub dwell_min: Duration,
    pub dwell_max: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            retention: 10,
            soft_cap: 10,
            dwell_min: Duration::from_secs(8),
            dwell_max: Duration::from_secs(12),
        }
    }
}

impl TurnSettings {
    pub fn from_config(config: &SitoutConfig) -> Self {
        let (dwell_min, dwell_max) = config.conversation.dwell_bounds();
        Self {
            retention: config.conversation.retention,
            soft_cap: config.conversation.soft_cap,
            dwell_min,
            dwell_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    Paused,
}

/// Why a turn request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `start()` has not run, or the conversation was reset.
    NotActive,
    /// `start()` called on a conversation that already has history.
    AlreadyStarted,
    Paused,
    /// Another turn is in flight.
    Generating,
    /// Dwell interval since the last turn has not elapsed.
    Dwelling { remaining: Duration },
    /// The conversation was reset while this turn was generating.
    Stale,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotActive => write!(f, "conversation not active"),
            Self::AlreadyStarted => write!(f, "conversation already started"),
            Self::Paused => write!(f, "conversation paused"),
            Self::Generating => write!(f, "turn already in progress"),
            Self::Dwelling { remaining } => {
                write!(f, "dwelling ({} ms left)", remaining.as_millis())
            }
            Self::Stale => write!(f, "conversation reset during generation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Spoke(Message),
    Skipped(SkipReason),
}

impl TurnOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Spoke(message) => Some(message),
            Self::Skipped(_) => None,
        }
    }
}

/// Read-only view for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub phase: Phase,
    pub history: Vec<Message>,
    pub active_speaker: PersonaId,
    pub is_generating: bool,
    pub is_paused: bool,
    pub is_active: bool,
}

#[derive(Debug)]
struct ConversationState {
    phase: Phase,
    history: ConversationHistory,
    active_index: usize,
    generating: bool,
    /// Bumped on reset; turns started under an older epoch are discarded.
    epoch: u64,
    next_message_id: u64,
    last_turn_at: Option<Instant>,
    dwell: Duration,
}

impl ConversationState {
    fn new(retention: usize) -> Self {
        Self {
            phase: Phase::Idle,
            history: ConversationHistory::new(retention),
            active_index: 0,
            generating: false,
            epoch: 0,
            next_message_id: 1,
            last_turn_at: None,
            dwell: Duration::ZERO,
        }
    }
}

/// Drives the conversation one turn at a time.
///
/// All methods take `&self`. State lives behind a mutex that is released
/// before the generation call is awaited, so a concurrent request observes
/// `is_generating` and returns [`SkipReason::Generating`].
pub struct TurnScheduler {
    personas: Vec<Persona>,
    client: Arc<GenerationClient>,
    fallback: FallbackSelector,
    speech: Arc<dyn SpeechSink>,
    settings: TurnSettings,
    state: Mutex<ConversationState>,
    dwell_rng: Mutex<StdRng>,
}

impl TurnScheduler {
    pub fn new(
        personas: Vec<Persona>,
        client: Arc<GenerationClient>,
        fallback: FallbackSelector,
        settings: TurnSettings,
    ) -> Result<Self> {
        if personas.is_empty() {
            bail!("TurnScheduler needs at least one persona");
        }
        let mut settings = settings;
        if settings.dwell_min > settings.dwell_max {
            std::mem::swap(&mut settings.dwell_min, &mut settings.dwell_max);
        }
        // History never grows past retention, so a larger cap would never fire.
        let retention = settings.retention.max(1);
        if settings.soft_cap > retention {
            warn!(
                soft_cap = settings.soft_cap,
                retention, "Soft cap exceeds retention; clamping"
            );
            settings.soft_cap = retention;
        }
        Ok(Self {
            personas,
            client,
            fallback,
            speech: Arc::new(NullSpeech),
            state: Mutex::new(ConversationState::new(settings.retention)),
            settings,
            dwell_rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Offer every appended message to `speech`.
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSink>) -> Self {
        self.speech = speech;
        self
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Open the conversation with persona[0]. No-op unless idle with empty history.
    pub async fn start(&self) -> TurnOutcome {
        let (history, epoch) = {
            let mut state = self.lock_state();
            if state.phase != Phase::Idle || !state.history.is_empty() {
                return TurnOutcome::Skipped(SkipReason::AlreadyStarted);
            }
            if state.generating {
                return TurnOutcome::Skipped(SkipReason::Generating);
            }
            state.phase = Phase::Active;
            state.generating = true;
            state.active_index = 0;
            (state.history.clone(), state.epoch)
        };

        let opener = &self.personas[0];
        let hour = chrono::Local::now().hour();
        info!(persona = %opener.id, "Starting conversation");
        let (text, source) = match self.client.generate_at_hour(opener, &history, hour).await {
            Ok(text) => (text, MessageSource::Generated),
            Err(failure) => {
                warn!(persona = %opener.id, %failure, "Opening line unavailable; using fallback");
                (
                    self.fallback.select_opening(opener, hour),
                    MessageSource::Fallback,
                )
            }
        };
        self.finish_turn(0, epoch, text, source)
    }

    pub async fn request_next_turn(&self) -> TurnOutcome {
        self.request_next_turn_at(Instant::now()).await
    }

    /// Run one turn for the active persona if the conversation allows it at `now`.
    pub async fn request_next_turn_at(&self, now: Instant) -> TurnOutcome {
        let (index, history, epoch) = {
            let mut state = self.lock_state();
            match state.phase {
                Phase::Idle => return TurnOutcome::Skipped(SkipReason::NotActive),
                Phase::Paused => return TurnOutcome::Skipped(SkipReason::Paused),
                Phase::Active => {}
            }
            if state.generating {
                return TurnOutcome::Skipped(SkipReason::Generating);
            }
            if let Some(last) = state.last_turn_at {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < state.dwell {
                    let remaining = state.dwell - elapsed;
                    debug!(remaining_ms = remaining.as_millis() as u64, "Dwell not elapsed");
                    return TurnOutcome::Skipped(SkipReason::Dwelling { remaining });
                }
            }
            state.generating = true;
            (state.active_index, state.history.clone(), state.epoch)
        };

        let persona = &self.personas[index];
        let (text, source) = match self.client.generate(persona, &history).await {
            Ok(text) => (text, MessageSource::Generated),
            Err(failure) => {
                warn!(persona = %persona.id, %failure, "Generation failed; using fallback line");
                (
                    self.fallback.select(persona, &history),
                    MessageSource::Fallback,
                )
            }
        };
        self.finish_turn(index, epoch, text, source)
    }

    /// Stop automatic progression. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase == Phase::Active {
            state.phase = Phase::Paused;
            info!("Conversation paused");
            true
        } else {
            false
        }
    }

    /// Resume progression. Does not run a turn by itself.
    pub fn resume(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase == Phase::Paused {
            state.phase = Phase::Active;
            info!("Conversation resumed");
            true
        } else {
            false
        }
    }

    /// Clear history and return to `Idle`. An in-flight turn is discarded.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        let epoch = state.epoch.wrapping_add(1);
        *state = ConversationState::new(self.settings.retention);
        state.epoch = epoch;
        info!(epoch, "Conversation reset");
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.lock_state();
        ConversationSnapshot {
            phase: state.phase,
            history: state.history.to_vec(),
            active_speaker: self.personas[state.active_index].id.clone(),
            is_generating: state.generating,
            is_paused: state.phase == Phase::Paused,
            is_active: state.phase != Phase::Idle,
        }
    }

    fn finish_turn(
        &self,
        index: usize,
        epoch: u64,
        text: String,
        source: MessageSource,
    ) -> TurnOutcome {
        let persona = &self.personas[index];
        let message = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                debug!(persona = %persona.id, "Discarding turn from before reset");
                return TurnOutcome::Skipped(SkipReason::Stale);
            }
            let message = Message::new(state.next_message_id, persona, text, source);
            state.next_message_id += 1;
            state.history.push(message.clone());
            state.active_index = (index + 1) % self.personas.len();
            state.generating = false;
            state.last_turn_at = Some(Instant::now());
            state.dwell = self.draw_dwell();

            if state.phase == Phase::Active && state.history.len() >= self.settings.soft_cap {
                state.phase = Phase::Paused;
                info!(
                    messages = state.history.len(),
                    soft_cap = self.settings.soft_cap,
                    "Soft cap reached; conversation paused"
                );
            }
            message
        };

        info!(
            persona = %persona.id,
            fallback = source.is_fallback(),
            "Turn complete"
        );
        self.speech.speak(&message, persona);
        TurnOutcome::Spoke(message)
    }

    fn draw_dwell(&self) -> Duration {
        let min = self.settings.dwell_min.as_millis() as u64;
        let max = self.settings.dwell_max.as_millis() as u64;
        let mut rng = self.dwell_rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.gen_range(min..=max))
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "turn_tests.rs"]
mod tests;
