use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitout_core::OutputFormat;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SITOUT_GIT_DESCRIBE"),
    ")"
);

#[derive(Parser)]
#[command(name = "sitout")]
#[command(about = "Sitout: an evening chat between Kerala neighbours, one turn at a time")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Config file (defaults to $SITOUT_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the conversation until the soft cap, --turns, or Ctrl-C
    Run {
        /// Never call the provider; every line comes from fallbacks
        #[arg(long)]
        offline: bool,

        /// Stop after this many messages (including the opening line)
        #[arg(long)]
        turns: Option<usize>,

        /// Speak each line with the configured [speech] command
        #[arg(long)]
        speak: bool,
    },

    /// List the personas in speaking order
    Personas,

    /// Inspect and test API keys
    Keys {
        #[command(subcommand)]
        cmd: KeysCommands,
    },

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum KeysCommands {
    /// List configured keys (masked) in rotation order; `probe` tests them
    Status,
    /// Send a minimal prompt with each key in turn and report which work
    Probe {
        /// Pause between keys to stay under provider rate limits
        #[arg(long, default_value_t = 10)]
        delay_secs: u64,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration
    Validate,
    /// Print the config file path in use
    Path,
}
