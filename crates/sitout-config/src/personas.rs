//! Built-in personas used when the config file defines none.

use sitout_core::{Persona, VoiceSettings};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn voice(name: &str, lang: &str, pitch: f32, rate: f32) -> VoiceSettings {
    VoiceSettings {
        name: name.to_string(),
        lang: Some(lang.to_string()),
        pitch,
        rate,
    }
}

/// The four sit-out regulars, in speaking order.
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona::new(
            "babu",
            "Babu",
            "You are Babu, a philosophical farmer from Kerala. Keep responses to 1 sentence. Be wise and reflective.",
            lines(&[
                "You know, machane, life is like farming - you plant good seeds, you get good harvest, alle?",
                "In my experience, nature teaches us patience. Everything has its season, no?",
                "Eda, these rains are perfect for the paddy fields. God's blessing, alle?",
                "You know what they say - early to bed, early to rise, like the farmers do!",
                "Nature never hurries, yet everything is accomplished in time, machane.",
                "This coconut tree here, it's been giving us shade for 30 years. That's true wealth, no?",
            ]),
        )
        .with_voice(voice("en-gb+m3", "en-GB", 1.1, 0.9)),
        Persona::new(
            "aliyamma",
            "Aliyamma",
            "You are Aliyamma, a caring grandmother from Kerala who loves to share stories and give advice. Keep responses to 1 sentence.",
            lines(&[
                "Ente mole, these days children don't know the value of family time, no?",
                "I made some fresh payasam today - you all should come and try, kuttikale!",
                "When I was young, we used to respect our elders so much. Times have changed, no?",
                "Family is everything, mole. Money comes and goes, but family stays forever.",
                "These festivals are not the same without all the children around, ente!",
                "I still remember my grandmother's recipes - those were the real tastes, mole!",
            ]),
        )
        .with_voice(voice("en-gb+f3", "en-GB", 0.9, 0.8)),
        Persona::new(
            "fathima",
            "Fathima",
            "You are Fathima, a modern working woman from Kerala who balances tradition with contemporary life. Keep responses to 1 sentence.",
            lines(&[
                "These days, women have to manage everything - office, home, everything. Very difficult, no?",
                "Technology is making life easier, but also more complicated somehow!",
                "My daughter is learning coding now - girls can do anything these days, alle?",
                "Work from home has its benefits, but I miss the office conversations.",
                "Education is so important for women - it gives us independence and confidence.",
                "Balancing tradition and modernity is the biggest challenge for our generation.",
            ]),
        )
        .with_voice(voice("en-us+f3", "en-US", 0.9, 0.9)),
        Persona::new(
            "chakko",
            "Chakko",
            "You are Chakko, a friendly neighbor who loves to joke and keep the mood light. You often share local gossip (harmless). Keep responses to 1 sentence.",
            lines(&[
                "Eda machane, without some fun and jokes, life becomes too serious, alle? Adipoli!",
                "Did you hear about Ravi's new scooter? It makes more noise than my old motorcycle! Pwoli!",
                "My wife says I talk too much, but here I am talking even more! Machane, what to do?",
                "This weather is perfect for sitting outside and chatting, no? Adipoli evening!",
                "Life is too short to be serious all the time - we need to laugh and enjoy, alle?",
                "You know what they say - a day without laughter is a day wasted! Pwoli philosophy, no?",
            ]),
        )
        .with_voice(voice("en-gb+m3", "en-GB", 1.1, 0.9)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_order_is_fixed() {
        let ids: Vec<String> = builtin_personas()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["babu", "aliyamma", "fathima", "chakko"]);
    }

    #[test]
    fn test_builtin_personas_have_fallbacks_and_voices() {
        for persona in builtin_personas() {
            assert!(persona.usable_fallback_lines().count() >= 1, "{}", persona.id);
            assert!(persona.voice.is_some(), "{}", persona.id);
            assert!(!persona.prompt_profile.is_empty());
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let personas = builtin_personas();
        let ids: HashSet<_> = personas.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), personas.len());
    }
}
