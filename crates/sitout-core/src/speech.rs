//! Boundary to speech playback.

use crate::types::{Message, Persona};

/// Receives finalized messages for audio playback.
///
/// Fire-and-forget: implementations must return immediately and swallow
/// their own failures. Playback never influences the conversation.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, message: &Message, persona: &Persona);
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeech;

impl SpeechSink for NullSpeech {
    fn speak(&self, _message: &Message, _persona: &Persona) {}
}
