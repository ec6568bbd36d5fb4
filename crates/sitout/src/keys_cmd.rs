use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::json;
use sitout_config::{ProviderKind, SitoutConfig, mask_secret};
use sitout_core::{GenerationRequest, OutputFormat};
use sitout_provider::build_provider;
use sitout_scheduler::{GenerationClient, classify};
use tracing::info;

const PROBE_PROMPT: &str = "Say only: Hello";

/// Handle `sitout keys status`: the keys that passed format checks, masked.
///
/// Health is only known after calling the provider, so it is left to
/// `keys probe`.
pub(crate) fn handle_keys_status(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = SitoutConfig::load(config_path)?;
    let keys = masked_keys(&config);
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = keys
                .iter()
                .enumerate()
                .map(|(index, key)| json!({ "index": index, "key": key }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if keys.is_empty() {
                eprintln!(
                    "No usable API keys. Add [credentials].keys or export {}1..9.",
                    config.credentials.env_prefix
                );
                return Ok(());
            }
            for (index, key) in keys.iter().enumerate() {
                println!("{:>2}. {key}", index + 1);
            }
            println!(
                "{} key(s) configured; run `sitout keys probe` to test them",
                keys.len()
            );
        }
    }
    Ok(())
}

fn masked_keys(config: &SitoutConfig) -> Vec<String> {
    config
        .resolve_credentials()
        .iter()
        .map(|key| mask_secret(key))
        .collect()
}

/// Handle `sitout keys probe`: one minimal request per key, serially.
pub(crate) async fn handle_keys_probe(
    config_path: Option<&Path>,
    delay_secs: u64,
    format: OutputFormat,
) -> Result<()> {
    let config = SitoutConfig::load(config_path)?;
    if config.provider.kind == ProviderKind::Offline {
        bail!("Provider kind is 'offline'; set [provider].kind to probe keys");
    }
    let client = GenerationClient::from_config(build_provider(&config.provider)?, &config);
    let total = client.credential_count();
    if total == 0 {
        bail!(
            "No usable API keys. Add [credentials].keys or export {}1..9",
            config.credentials.env_prefix
        );
    }

    let request = GenerationRequest {
        system: String::new(),
        prompt: PROBE_PROMPT.to_string(),
        temperature: 0.0,
    };
    let mut working = 0usize;
    for index in 0..total {
        if index > 0 && delay_secs > 0 {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        }
        let Some(result) = client.probe(index, &request).await else {
            continue;
        };
        let masked = client.credential_status()[index].key.clone();
        match result {
            Ok(_) => {
                working += 1;
                if matches!(format, OutputFormat::Text) {
                    println!("{:>2}. {masked}  ok", index + 1);
                }
            }
            Err(e) => {
                if matches!(format, OutputFormat::Text) {
                    println!("{:>2}. {masked}  {}: {}", index + 1, classify(&e), e);
                }
            }
        }
    }
    info!(working, total, "Key probe finished");

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&client.credential_status())?
        ),
        OutputFormat::Text => println!("{working}/{total} key(s) working"),
    }
    Ok(())
}
