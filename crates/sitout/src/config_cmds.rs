use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sitout_config::{SitoutConfig, validate_config};
use sitout_core::OutputFormat;

/// Load config and fill in the built-in cast so `show` prints what `run` uses.
fn effective_config(config_path: Option<&Path>) -> Result<SitoutConfig> {
    let mut config = SitoutConfig::load(config_path)?;
    config.personas = config.personas();
    Ok(config)
}

pub(crate) fn handle_config_show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = effective_config(config_path)?;
    match format {
        OutputFormat::Json => {
            let json_str = serde_json::to_string_pretty(&config)?;
            println!("{}", json_str);
        }
        OutputFormat::Text => {
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

pub(crate) fn handle_config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = target_path(config_path)?;
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    SitoutConfig::save_template_to(&path)?;
    eprintln!("Wrote default config to: {}", path.display());
    eprintln!("  Add API keys under [credentials] or export SITOUT_API_KEY_1..9.");
    Ok(())
}

pub(crate) fn handle_config_validate(config_path: Option<&Path>) -> Result<()> {
    let config = SitoutConfig::load(config_path)?;
    validate_config(&config)?;
    let keys = config.resolve_credentials().len();
    eprintln!(
        "Configuration is valid ({} personas, {} usable key(s), provider {}).",
        config.personas().len(),
        keys,
        config.provider.kind.as_str()
    );
    Ok(())
}

pub(crate) fn handle_config_path(config_path: Option<&Path>) -> Result<()> {
    let path = target_path(config_path)?;
    let note = if path.exists() { "" } else { " (not found; defaults in use)" };
    println!("{}{}", path.display(), note);
    Ok(())
}

fn target_path(config_path: Option<&Path>) -> Result<PathBuf> {
    SitoutConfig::resolve_path(config_path).context("Failed to determine config directory")
}
