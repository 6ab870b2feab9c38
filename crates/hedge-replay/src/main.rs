//! hedge-replay - Entry Point
//!
//! `run`: replay an event file and print the final registry snapshot.
//! `set-mode`: rewrite the position mode of every futures venue in a config file.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use hedge_core::PositionMode;
use tracing::info;

/// Hedge-mode position accounting replay tool
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines event file through the position registry
    Run {
        /// Configuration file path (can also be set via HEDGE_CONFIG env var)
        #[arg(short, long)]
        config: Option<String>,

        /// Event file, one JSON event per line
        #[arg(short, long)]
        events: PathBuf,
    },
    /// Set futures_position_mode on every futures venue
    SetMode {
        /// Configuration file path (can also be set via HEDGE_CONFIG env var)
        #[arg(short, long)]
        config: Option<String>,

        mode: ModeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Hedge,
    OneWay,
}

impl From<ModeArg> for PositionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Hedge => PositionMode::Hedge,
            ModeArg::OneWay => PositionMode::OneWay,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run { config, events } => {
            let config_path = hedge_replay::resolve_config_path(config);
            let config = hedge_replay::AppConfig::from_file(&config_path)?;
            hedge_telemetry::init_logging_with(&config.telemetry.log_level)?;

            info!("Starting hedge-replay v{}", env!("CARGO_PKG_VERSION"));
            info!(config_path = %config_path, routing = %config.routing, "Configuration loaded");

            let mut replayer = hedge_replay::Replayer::new(&config)?;
            replayer.replay_file(&events)?;

            println!("{}", serde_json::to_string_pretty(&replayer.report())?);
        }
        Command::SetMode { config, mode } => {
            hedge_telemetry::init_logging()?;

            let config_path = hedge_replay::resolve_config_path(config);
            let mut app_config = hedge_replay::AppConfig::from_file(&config_path)?;
            let mode = PositionMode::from(mode);

            let changes = app_config.set_futures_position_mode(mode);
            if changes.is_empty() {
                info!(config_path = %config_path, mode = %mode, "No futures venues to update");
                return Ok(());
            }
            for change in &changes {
                info!(venue = %change.venue, from = %change.from, to = %change.to, "Position mode updated");
            }
            app_config.save(&config_path)?;
            info!(config_path = %config_path, updated = changes.len(), "Configuration saved");
        }
    }

    Ok(())
}
