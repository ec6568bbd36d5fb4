//! Fire-and-forget speech playback through an external TTS command.

use std::process::Stdio;

use sitout_core::{Message, Persona, SpeechSink, VoiceSettings};
use tracing::{debug, warn};

/// espeak-ng defaults: pitch 50 (0-99), 175 words per minute.
const BASE_PITCH: f32 = 50.0;
const BASE_WPM: f32 = 175.0;

/// Spawns an espeak-compatible command (`-v voice -p pitch -s speed text`)
/// for every message. The child is never awaited.
pub(crate) struct CommandSpeech {
    command: String,
}

impl CommandSpeech {
    pub(crate) fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl SpeechSink for CommandSpeech {
    fn speak(&self, message: &Message, persona: &Persona) {
        let args = speech_args(&message.text, persona.voice.as_ref());
        let spawned = tokio::process::Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_child) => debug!(command = %self.command, persona = %persona.id, "Speaking"),
            Err(e) => warn!(command = %self.command, "Failed to start speech command: {e}"),
        }
    }
}

fn speech_args(text: &str, voice: Option<&VoiceSettings>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(voice) = voice {
        let pitch = (voice.pitch * BASE_PITCH).round().clamp(0.0, 99.0) as u32;
        let wpm = (voice.rate * BASE_WPM).round().clamp(80.0, 450.0) as u32;
        args.extend([
            "-v".to_string(),
            voice.name.clone(),
            "-p".to_string(),
            pitch.to_string(),
            "-s".to_string(),
            wpm.to_string(),
        ]);
    }
    args.push(text.to_string());
    args
}
