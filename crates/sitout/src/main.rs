use anyhow::Result;
use clap::Parser;

mod cli;
mod config_cmds;
mod keys_cmd;
mod personas_cmd;
mod render;
mod run_cmd;
mod speech;

use cli::{Cli, Commands, ConfigCommands, KeysCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let output_format = cli.format.clone();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            offline,
            turns,
            speak,
        } => {
            run_cmd::handle_run(config_path, offline, turns, speak, output_format).await?;
        }
        Commands::Personas => {
            personas_cmd::handle_personas(config_path, output_format)?;
        }
        Commands::Keys { cmd } => match cmd {
            KeysCommands::Status => {
                keys_cmd::handle_keys_status(config_path, output_format)?;
            }
            KeysCommands::Probe { delay_secs } => {
                keys_cmd::handle_keys_probe(config_path, delay_secs, output_format).await?;
            }
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => {
                config_cmds::handle_config_show(config_path, output_format)?;
            }
            ConfigCommands::Init { force } => {
                config_cmds::handle_config_init(config_path, force)?;
            }
            ConfigCommands::Validate => {
                config_cmds::handle_config_validate(config_path)?;
            }
            ConfigCommands::Path => {
                config_cmds::handle_config_path(config_path)?;
            }
        },
    }

    Ok(())
}
