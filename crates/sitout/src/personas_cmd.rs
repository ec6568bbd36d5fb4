use std::path::Path;

use anyhow::Result;
use sitout_config::SitoutConfig;
use sitout_core::{OutputFormat, Persona};

/// Handle `sitout personas`.
pub(crate) fn handle_personas(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = SitoutConfig::load(config_path)?;
    let personas = config.personas();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&personas)?),
        OutputFormat::Text => {
            for (i, persona) in personas.iter().enumerate() {
                println!("{}", describe(i, persona));
            }
        }
    }
    Ok(())
}

fn describe(position: usize, persona: &Persona) -> String {
    let lines = persona.usable_fallback_lines().count();
    let voice = persona
        .voice
        .as_ref()
        .map(|v| format!(", voice {}", v.name))
        .unwrap_or_default();
    format!(
        "{}. {} ({}): {} fallback line(s){}",
        position + 1,
        persona.display_name,
        persona.id,
        lines,
        voice
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitout_config::builtin_personas;

    #[test]
    fn test_describe_builtin() {
        let personas = builtin_personas();
        let line = describe(0, &personas[0]);
        assert!(line.starts_with("1. Babu (babu): "));
        assert!(line.ends_with(", voice en-gb+m3"));
    }
}
