use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Stable identifier of a persona (e.g. `babu`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(String);

impl PersonaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonaId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Voice parameters handed to the speech sink for a persona.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Engine-specific voice name (e.g. `en-gb` for espeak-ng).
    pub name: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default = "default_unit")]
    pub pitch: f32,
    #[serde(default = "default_unit")]
    pub rate: f32,
}

fn default_unit() -> f32 {
    1.0
}

/// A fixed conversational character.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: String,
    /// Persona description used as the generation system profile.
    pub prompt_profile: String,
    /// Pre-authored lines used when generation is unavailable.
    pub fallback_lines: Vec<String>,
    #[serde(default)]
    pub voice: Option<VoiceSettings>,
}

impl Persona {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        prompt_profile: impl Into<String>,
        fallback_lines: Vec<String>,
    ) -> Self {
        Self {
            id: PersonaId::new(id),
            display_name: display_name.into(),
            prompt_profile: prompt_profile.into(),
            fallback_lines,
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Fallback lines that contain more than whitespace.
    pub fn usable_fallback_lines(&self) -> impl Iterator<Item = &str> {
        self.fallback_lines
            .iter()
            .map(String::as_str)
            .filter(|line| !line.trim().is_empty())
    }
}

/// Where the text of a message came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Generated,
    Fallback,
}

impl MessageSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// One line of dialogue appended by the turn scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub speaker_id: PersonaId,
    pub speaker_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub source: MessageSource,
}

impl Message {
    pub fn new(id: u64, speaker: &Persona, text: impl Into<String>, source: MessageSource) -> Self {
        Self {
            id,
            speaker_id: speaker.id.clone(),
            speaker_name: speaker.display_name.clone(),
            text: text.into().trim().to_string(),
            created_at: Utc::now(),
            source,
        }
    }

    /// `"speakerName: text"`, the line format used in prompts.
    pub fn as_transcript_line(&self) -> String {
        format!("{}: {}", self.speaker_name, self.text)
    }
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn babu() -> Persona {
        Persona::new(
            "babu",
            "Babu",
            "A philosophical farmer.",
            vec!["Nature never hurries.".to_string(), "   ".to_string()],
        )
    }

    #[test]
    fn test_message_trims_text() {
        let msg = Message::new(1, &babu(), "  hello there \n", MessageSource::Generated);
        assert_eq!(msg.text, "hello there");
        assert_eq!(msg.speaker_id.as_str(), "babu");
        assert_eq!(msg.speaker_name, "Babu");
    }

    #[test]
    fn test_transcript_line_format() {
        let msg = Message::new(7, &babu(), "Eda, rain again", MessageSource::Fallback);
        assert_eq!(msg.as_transcript_line(), "Babu: Eda, rain again");
        assert!(msg.source.is_fallback());
    }

    #[test]
    fn test_usable_fallback_lines_skips_blank() {
        let persona = babu();
        let lines: Vec<&str> = persona.usable_fallback_lines().collect();
        assert_eq!(lines, vec!["Nature never hurries."]);
    }

    #[test]
    fn test_persona_id_serializes_transparently() {
        let json = serde_json::to_string(&PersonaId::new("chakko")).unwrap();
        assert_eq!(json, "\"chakko\"");
    }

    #[test]
    fn test_message_source_serde_snake_case() {
        let json = serde_json::to_string(&MessageSource::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
    }
}
