//! Prompt assembly for persona turns and opening lines.

use std::collections::HashSet;

use sitout_core::{ConversationHistory, GenerationRequest, Persona};

/// Prompt and sampling knobs taken from config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptSettings {
    /// Recent messages included in each prompt.
    pub context_window: usize,
    pub temperature: f32,
    pub opening_temperature: f32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            context_window: 5,
            temperature: 0.8,
            opening_temperature: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Morning 6-11, afternoon 12-16, evening otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Thoughtful,
    Excited,
    Calm,
}

impl Mood {
    /// Mood inferred from the persona's own latest message; `Calm` if silent so far.
    pub fn infer(persona: &Persona, history: &ConversationHistory) -> Self {
        let Some(own) = history.iter().rev().find(|m| m.speaker_id == persona.id) else {
            return Self::Calm;
        };
        let text = own.text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));
        if has(&["happy", "great", "wonderful"]) {
            Self::Happy
        } else if has(&["think", "remember", "wisdom"]) {
            Self::Thoughtful
        } else if has(&["exciting", "amazing", "wow"]) {
            Self::Excited
        } else {
            Self::Calm
        }
    }

    fn context_line(&self) -> &'static str {
        match self {
            Self::Happy => "You're feeling cheerful and optimistic today.",
            Self::Thoughtful => "You're in a reflective, contemplative mood.",
            Self::Excited => "You're energetic and enthusiastic about the chat.",
            Self::Calm => "You're relaxed and enjoying the peaceful conversation.",
        }
    }
}

const STYLE_GUIDE: &str = "\
Conversation style:
- Mix Malayalam and English the way people in Kerala naturally do
- Stay casual and true to sit-out culture; mention local traditions or experiences when they fit
- Keep your own perspective while engaging with the others
- Use expressions like 'alle?', 'no?', 'eda', 'machane', 'mole' naturally
- Reply in one or two sentences, without prefixing your name

You are sitting in a traditional Kerala courtyard, chatting with friends and neighbours.";

/// Build the request for `persona`'s next line.
///
/// An empty history yields an opening-line request for the given local `hour`.
pub fn build_request(
    persona: &Persona,
    history: &ConversationHistory,
    settings: &PromptSettings,
    hour: u32,
) -> GenerationRequest {
    let mood = Mood::infer(persona, history);
    let system = format!(
        "{}\n\nCurrent mood: {}\n\n{}",
        persona.prompt_profile.trim(),
        mood.context_line(),
        STYLE_GUIDE
    );

    if history.is_empty() {
        return GenerationRequest {
            system,
            prompt: opening_prompt(persona, TimeOfDay::from_hour(hour)),
            temperature: settings.opening_temperature,
        };
    }

    GenerationRequest {
        system,
        prompt: turn_prompt(persona, history, settings.context_window),
        temperature: settings.temperature,
    }
}

fn opening_prompt(persona: &Persona, time: TimeOfDay) -> String {
    format!(
        "You are {name}, opening a casual {time} chat in a Kerala sit-out.\n\
         Greet everyone warmly and mention the {time}, the weather or the neighbourhood.\n\
         Write a single natural conversation starter (1-2 sentences).",
        name = persona.display_name,
        time = time.as_str(),
    )
}

fn turn_prompt(persona: &Persona, history: &ConversationHistory, window: usize) -> String {
    let recent: Vec<_> = history.recent(window.max(1)).collect();
    let transcript = recent
        .iter()
        .map(|m| m.as_transcript_line())
        .collect::<Vec<_>>()
        .join("\n");

    let last_speaker = recent.last().map(|m| m.speaker_name.as_str());
    let responding = match last_speaker {
        Some(name) => format!("You are responding to {name}'s message"),
        None => "You are continuing the conversation".to_string(),
    };
    let follow_up = if recent.last().is_some_and(|m| m.speaker_id == persona.id) {
        "Avoid repeating yourself; add something new"
    } else {
        "Build on what the others have said"
    };

    let topics = recent_topics(history, window.max(1), 3);
    let topics = if topics.is_empty() {
        "general chat".to_string()
    } else {
        topics.join(", ")
    };

    format!(
        "Previous conversation:\n{transcript}\n\n\
         Context:\n\
         - You are {name}\n\
         - {responding}\n\
         - {stage}\n\
         - Recent topics: {topics}\n\
         - {follow_up}\n\n\
         Reply naturally as {name}, in character, in 1-2 sentences.",
        name = persona.display_name,
        stage = stage_context(history.len()),
    )
}

/// Conversation stage hint: early (< 3 messages), warming (< 8), ongoing.
pub fn stage_context(len: usize) -> &'static str {
    match len {
        0..=2 => "This is early in the conversation; be welcoming and set a friendly tone.",
        3..=7 => "The conversation is warming up; build on earlier topics naturally.",
        _ => "This is an ongoing conversation; deepen the discussion or bring up a related topic.",
    }
}

/// Distinct words longer than four letters from the last `window` messages.
fn recent_topics(history: &ConversationHistory, window: usize, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .recent(window)
        .flat_map(|m| {
            m.text
                .split_whitespace()
                .map(|w| {
                    w.trim_matches(|c: char| !c.is_alphanumeric())
                        .to_lowercase()
                })
                .collect::<Vec<_>>()
        })
        .filter(|w| w.chars().count() > 4)
        .filter(|w| seen.insert(w.clone()))
        .take(limit)
        .collect()
}
