//! Pedalboard CLI - inspect pedals, presets and board wiring.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pedalboard")]
#[command(author, version, about = "Guitar pedal board CLI", long_about = None)]
struct Cli {
    /// Log board wiring at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available pedals and their pots
    Pedals(commands::pedals::PedalsArgs),

    /// Show, validate and manage board presets
    Preset(commands::preset::PresetArgs),

    /// Load a preset onto a board and print its signal graph
    Topology(commands::topology::TopologyArgs),

    /// Route a WAV file through a preset on the stage
    Play(commands::play::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Pedals(args) => commands::pedals::run(args),
        Commands::Preset(args) => commands::preset::run(args),
        Commands::Topology(args) => commands::topology::run(args),
        Commands::Play(args) => commands::play::run(args),
    }
}
