//! Terminal rendering of conversation messages.

use chrono::Local;
use sitout_core::{Message, OutputFormat};

/// One line per message: `[HH:MM] [Name] text`, or a JSON object per line.
pub(crate) fn render_message(message: &Message, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(message).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize message: {e}");
            String::new()
        }),
        OutputFormat::Text => {
            let time = message.created_at.with_timezone(&Local).format("%H:%M");
            format!("[{time}] {}", bubble(message))
        }
    }
}

/// `[Name] text`, with fallback lines marked.
fn bubble(message: &Message) -> String {
    let marker = if message.source.is_fallback() { " ~" } else { "" };
    format!("[{}{}] {}", message.speaker_name, marker, message.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitout_core::{MessageSource, Persona};

    fn message(source: MessageSource) -> Message {
        let babu = Persona::new("babu", "Babu", "", vec![]);
        Message::new(1, &babu, "Nice evening, alle?", source)
    }

    #[test]
    fn test_bubble_marks_fallback() {
        assert_eq!(
            bubble(&message(MessageSource::Generated)),
            "[Babu] Nice evening, alle?"
        );
        assert_eq!(
            bubble(&message(MessageSource::Fallback)),
            "[Babu ~] Nice evening, alle?"
        );
    }

    #[test]
    fn test_json_line_roundtrips() {
        let original = message(MessageSource::Fallback);
        let line = render_message(&original, &OutputFormat::Json);
        let parsed: Message = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, original);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_text_line_has_time_prefix() {
        let line = render_message(&message(MessageSource::Generated), &OutputFormat::Text);
        assert!(line.starts_with('['));
        assert!(line.ends_with("[Babu] Nice evening, alle?"));
    }
}
