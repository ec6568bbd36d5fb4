use anyhow::{Result, bail};
use std::collections::HashSet;

use crate::config::SitoutConfig;

/// Validate a loaded configuration.
/// Returns Ok(()) if valid, or Err with a descriptive message.
pub fn validate_config(config: &SitoutConfig) -> Result<()> {
    validate_conversation(config)?;
    validate_rate_limit(config)?;
    validate_credentials(config)?;
    validate_provider(config)?;
    validate_personas(config)?;
    Ok(())
}

fn validate_conversation(config: &SitoutConfig) -> Result<()> {
    let conv = &config.conversation;
    if conv.retention == 0 {
        bail!("conversation.retention must be >= 1 (got 0)");
    }
    if conv.soft_cap == 0 {
        bail!("conversation.soft_cap must be >= 1 (got 0)");
    }
    if conv.soft_cap > conv.retention {
        bail!(
            "conversation.soft_cap ({}) must not exceed retention ({})",
            conv.soft_cap,
            conv.retention
        );
    }
    if conv.context_window == 0 {
        bail!("conversation.context_window must be >= 1 (got 0)");
    }
    if conv.dwell_min_ms > conv.dwell_max_ms {
        bail!(
            "conversation.dwell_min_ms ({}) must not exceed dwell_max_ms ({})",
            conv.dwell_min_ms,
            conv.dwell_max_ms
        );
    }
    Ok(())
}

fn validate_rate_limit(config: &SitoutConfig) -> Result<()> {
    let rl = &config.rate_limit;
    if rl.base_interval_ms == 0 {
        bail!("rate_limit.base_interval_ms must be > 0 (got 0)");
    }
    if rl.base_interval_ms > rl.max_interval_ms {
        bail!(
            "rate_limit.base_interval_ms ({}) must not exceed max_interval_ms ({})",
            rl.base_interval_ms,
            rl.max_interval_ms
        );
    }
    Ok(())
}

fn validate_credentials(config: &SitoutConfig) -> Result<()> {
    if config.credentials.max_attempts == 0 {
        bail!("credentials.max_attempts must be >= 1 (got 0)");
    }
    if config.credentials.env_prefix.trim().is_empty() {
        bail!("credentials.env_prefix cannot be empty");
    }
    Ok(())
}

fn validate_provider(config: &SitoutConfig) -> Result<()> {
    let provider = &config.provider;
    for (name, value) in [
        ("temperature", provider.temperature),
        ("opening_temperature", provider.opening_temperature),
    ] {
        if !(0.0..=2.0).contains(&value) {
            bail!("provider.{name} must be within [0, 2] (got {value})");
        }
    }
    if provider.model.trim().is_empty() {
        bail!("provider.model cannot be empty");
    }
    if provider.timeout_secs == 0 {
        bail!("provider.timeout_secs must be > 0 (got 0)");
    }
    Ok(())
}

fn validate_personas(config: &SitoutConfig) -> Result<()> {
    let personas = config.personas();
    if personas.is_empty() {
        bail!("At least one persona is required");
    }

    let mut seen = HashSet::new();
    for persona in &personas {
        let id = persona.id.as_str();
        if id.trim().is_empty() {
            bail!("personas: id cannot be empty");
        }
        if !seen.insert(id) {
            bail!("personas: duplicate id '{}'", id);
        }
        if persona.display_name.trim().is_empty() {
            bail!("personas.{}: display_name cannot be empty", id);
        }
        if persona.usable_fallback_lines().next().is_none() {
            bail!(
                "personas.{}: fallback_lines must contain at least one non-blank line",
                id
            );
        }
    }
    Ok(())
}
