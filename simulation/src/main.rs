//! Huddle - participant panel simulation
//!
//! Runs roster scenarios against an in-memory session and prints the panel
//! after every step.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use huddle_core::ParticipantId;
use huddle_logging::{HuddleSubscriberBuilder, LogConfig, ParticipantContextGuard};
use huddle_panel::PanelConfig;

use huddle_simulation::{RosterSim, scenarios};

/// Participant the simulated panel belongs to
const LOCAL_VIEWER: ParticipantId = ParticipantId(0);

#[derive(Parser)]
#[command(
    name = "huddle-sim",
    about = "Participant roster simulation with bounded display slots",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Panel configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of display slots
    #[arg(short, long, global = true)]
    slots: Option<usize>,

    /// Print the final panel as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// More joiners than slots, then a leave frees one up
    Overflow,

    /// A displayed participant's source vanishes and returns
    Dropout,

    /// A video surface appears after the join
    LateVideo,

    /// Random joins, leaves, dropouts and amplitude changes
    Churn {
        /// Number of ticks to run
        #[arg(short, long, default_value = "200")]
        ticks: u64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::development()
    } else {
        LogConfig {
            default_level: "info".to_string(),
            ..LogConfig::development()
        }
    };
    let _log_guard = HuddleSubscriberBuilder::new().with_config(log_config).init();

    let config = load_config(cli.config.as_ref(), cli.slots)?;
    let scope = match &cli.command {
        Commands::Overflow => "overflow",
        Commands::Dropout => "dropout",
        Commands::LateVideo => "late-video",
        Commands::Churn { .. } => "churn",
    };
    let _context = ParticipantContextGuard::with_scope(LOCAL_VIEWER, scope);

    let sim = match cli.command {
        Commands::Overflow => scenarios::run_overflow_scenario(config)?,
        Commands::Dropout => scenarios::run_dropout_scenario(config)?,
        Commands::LateVideo => scenarios::run_late_video_scenario(config)?,
        Commands::Churn { ticks, seed } => scenarios::run_churn_scenario(config, ticks, seed)?,
    };

    if cli.json {
        print_json(&sim)?;
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>, slots: Option<usize>) -> anyhow::Result<PanelConfig> {
    let mut config = match path {
        Some(path) => PanelConfig::load(path)
            .with_context(|| format!("loading panel config from {}", path.display()))?,
        None => PanelConfig::default(),
    };
    if let Some(slots) = slots {
        config.max_display_slots = slots;
    }
    config.validate()?;
    Ok(config)
}

fn print_json(sim: &RosterSim) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sim.snapshot())?;
    println!("{}", json);
    Ok(())
}
