use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sitout_config::{ProviderKind, SitoutConfig, validate_config};
use sitout_core::{GenerationProvider, NullSpeech, OutputFormat, SpeechSink};
use sitout_provider::{ScriptedProvider, build_provider};
use sitout_scheduler::{FallbackSelector, GenerationClient, TurnOutcome, TurnScheduler, TurnSettings};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::render::render_message;
use crate::speech::CommandSpeech;

/// How often the driver asks for the next turn. The scheduler's dwell
/// decides whether a turn actually runs.
const TICK: Duration = Duration::from_secs(1);

/// Handle `sitout run`.
pub(crate) async fn handle_run(
    config_path: Option<&Path>,
    offline: bool,
    turns: Option<usize>,
    speak: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = SitoutConfig::load(config_path)?;
    validate_config(&config)?;

    let scheduler = build_scheduler(&config, offline, speak)?;
    let mut spoken = 0usize;

    if let TurnOutcome::Spoke(message) = scheduler.start().await {
        println!("{}", render_message(&message, &format));
        spoken += 1;
    }

    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        if turns.is_some_and(|max| spoken >= max) {
            info!(spoken, "Turn limit reached");
            break;
        }
        let snapshot = scheduler.snapshot();
        if snapshot.is_paused {
            if matches!(format, OutputFormat::Text) {
                eprintln!(
                    "Conversation paused after {} messages (soft cap {}).",
                    snapshot.history.len(),
                    config.conversation.soft_cap
                );
            }
            break;
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                match scheduler.request_next_turn().await {
                    TurnOutcome::Spoke(message) => {
                        println!("{}", render_message(&message, &format));
                        spoken += 1;
                    }
                    TurnOutcome::Skipped(reason) => debug!(%reason, "Turn skipped"),
                }
            }
        }
    }

    Ok(())
}

fn build_scheduler(config: &SitoutConfig, offline: bool, speak: bool) -> Result<TurnScheduler> {
    let provider: Arc<dyn GenerationProvider> = if offline {
        Arc::new(ScriptedProvider::always_failing())
    } else {
        build_provider(&config.provider)?
    };
    let client = Arc::new(GenerationClient::from_config(provider, config));
    if !offline && config.provider.kind != ProviderKind::Offline && client.credential_count() == 0 {
        warn!(
            "No usable API keys; every line will be a fallback. Add [credentials].keys or export {}1..9",
            config.credentials.env_prefix
        );
    }
    info!(
        provider = client.provider_name(),
        keys = client.credential_count(),
        "Generation client ready"
    );

    let speech: Arc<dyn SpeechSink> = match (speak, config.speech.is_enabled()) {
        (true, true) => Arc::new(CommandSpeech::new(config.speech.command.trim())),
        (true, false) => {
            warn!("--speak ignored: [speech].command is empty");
            Arc::new(NullSpeech)
        }
        (false, _) => Arc::new(NullSpeech),
    };

    Ok(TurnScheduler::new(
        config.personas(),
        client,
        FallbackSelector::new(),
        TurnSettings::from_config(config),
    )?
    .with_speech(speech))
}
