//! Pre-authored replacement lines used whenever generation fails.
//!
//! Selection prefers lines on the topic of the latest message, then lines
//! matching the persona's mood, then any of the persona's lines. It never
//! fails and never returns an empty string.

use std::sync::{Mutex, OnceLock, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use sitout_core::{ConversationHistory, Persona};
use tracing::debug;

use crate::prompt::{Mood, TimeOfDay};

/// Used when a persona has no usable lines of its own.
pub const GENERIC_LINES: &[&str] = &[
    "That's interesting, no? Tell me more.",
    "Acha, I see your point. Very true!",
    "Hmm, that reminds me of something similar...",
    "Good point! I hadn't thought of it that way.",
    "Yes, these things happen in life, alle?",
];

const MORNING_STARTERS: &[&str] = &[
    "Good morning, everyone! Perfect weather for our morning chat, alle?",
    "Namaskaram! Early morning is the best time for good conversation, no?",
    "What a beautiful morning! Birds are singing, and the air is so fresh, eda!",
    "Morning time is thinking time, they say. What's on everyone's mind today?",
];

const AFTERNOON_STARTERS: &[&str] = &[
    "Good afternoon, kuttikale! Perfect time to take a break and chat, no?",
    "Eda, this afternoon breeze is so nice! Come, let's sit and talk.",
    "Lunch time is over, chat time begins! How is everyone doing?",
    "Afternoon conversations are different, alle? More relaxed and peaceful.",
];

const EVENING_STARTERS: &[&str] = &[
    "Namaskaram! How is everyone today? Beautiful evening we're having, alle?",
    "Good evening, kuttikale! Perfect time for a nice chat, no?",
    "Eda, what a lovely evening to sit outside and talk! Come, come, sit here.",
    "Ayyo, finally some time to relax and chat with good friends!",
    "This is what I call the perfect Kerala evening. Good weather, good company!",
    "Evening time is story time! Anyone have something interesting to share?",
    "Look at this beautiful sunset! Perfect backdrop for our evening chat, alle?",
];

const GENERAL_STARTERS: &[&str] = &[
    "Eda, it's been too long since we all sat together like this! How is everyone?",
    "You know what? There's nothing better than good friends and good conversation!",
    "Sitting here reminds me of the old days when neighbours actually talked to each other, no?",
    "Community time is the best time! What's happening in everyone's world?",
    "This kind of peaceful moment is exactly what we need more of, alle?",
];

struct LinePatterns {
    topics: Vec<Regex>,
    happy_line: Regex,
    thoughtful_line: Regex,
}

fn build_line_patterns() -> Option<LinePatterns> {
    Some(LinePatterns {
        topics: vec![
            Regex::new(r"(?i)weather|rain|sun|season|monsoon").ok()?,
            Regex::new(r"(?i)family|children|home|mole").ok()?,
            Regex::new(r"(?i)work|job|office").ok()?,
        ],
        happy_line: Regex::new(r"(?i)!|good|great").ok()?,
        thoughtful_line: Regex::new(r"(?i)think|remember|\?").ok()?,
    })
}

fn line_patterns() -> Option<&'static LinePatterns> {
    static PATTERNS: OnceLock<Option<LinePatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_line_patterns).as_ref()
}

pub struct FallbackSelector {
    rng: Mutex<StdRng>,
}

impl Default for FallbackSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackSelector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selection for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick a replacement line for `persona` given the conversation so far.
    pub fn select(&self, persona: &Persona, history: &ConversationHistory) -> String {
        let lines: Vec<&str> = persona.usable_fallback_lines().collect();
        if lines.is_empty() {
            debug!(persona = %persona.id, "No usable fallback lines; using generic set");
            return self.pick(GENERIC_LINES);
        }

        if let Some(patterns) = line_patterns() {
            if let Some(latest) = history.last() {
                for topic in &patterns.topics {
                    if !topic.is_match(&latest.text) {
                        continue;
                    }
                    let on_topic = filter_lines(&lines, topic);
                    if !on_topic.is_empty() {
                        debug!(persona = %persona.id, topic = topic.as_str(), "Topic fallback");
                        return self.pick(&on_topic);
                    }
                }
            }

            let mood_pattern = match Mood::infer(persona, history) {
                Mood::Happy => Some(&patterns.happy_line),
                Mood::Thoughtful => Some(&patterns.thoughtful_line),
                Mood::Excited | Mood::Calm => None,
            };
            if let Some(pattern) = mood_pattern {
                let in_mood = filter_lines(&lines, pattern);
                if !in_mood.is_empty() {
                    return self.pick(&in_mood);
                }
            }
        }

        self.pick(&lines)
    }

    /// Conversation starter for the given local `hour`.
    pub fn select_opening(&self, persona: &Persona, hour: u32) -> String {
        let time = TimeOfDay::from_hour(hour);
        let timed = match time {
            TimeOfDay::Morning => MORNING_STARTERS,
            TimeOfDay::Afternoon => AFTERNOON_STARTERS,
            TimeOfDay::Evening => EVENING_STARTERS,
        };
        let starters: Vec<&str> = timed.iter().chain(GENERAL_STARTERS).copied().collect();
        debug!(persona = %persona.id, time = time.as_str(), "Fallback opening line");
        self.pick(&starters)
    }

    fn pick(&self, lines: &[&str]) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        lines
            .choose(&mut *rng)
            .copied()
            .unwrap_or(GENERIC_LINES[0])
            .to_string()
    }
}

fn filter_lines<'a>(lines: &[&'a str], pattern: &Regex) -> Vec<&'a str> {
    lines
        .iter()
        .copied()
        .filter(|line| pattern.is_match(line))
        .collect()
}
