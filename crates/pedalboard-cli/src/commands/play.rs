//! Route a WAV file through a preset on the stage.
//!
//! There is no audio device behind the in-memory graph, so this reports
//! what the stage did: the decoded material, the board it went through and
//! the master chain it ended in.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pedalboard_config::Board;
use pedalboard_core::{AudioHost, SignalGraph};
use pedalboard_io::{Stage, WavLoader};
use pedalboard_registry::PedalRegistry;

use super::common::{GRAPH_SAMPLE_RATE, load_preset};

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play
    input: PathBuf,

    /// Preset name or path
    #[arg(short, long, default_value = "clean")]
    preset: String,

    /// Master volume (0-1)
    #[arg(long, default_value_t = 1.0)]
    volume: f32,

    /// Loop the file
    #[arg(long = "loop")]
    looping: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(play(args))
}

async fn play(args: PlayArgs) -> anyhow::Result<()> {
    let preset = load_preset(&args.preset)?;

    let mut graph = SignalGraph::new(GRAPH_SAMPLE_RATE);
    let mut stage = Stage::new(&mut graph);
    let mut board = Board::new(&mut graph);
    let report = board.deserialize(&mut graph, &preset, &PedalRegistry::new())?;
    stage.set_board(&mut graph, board);
    stage.set_volume(&mut graph, args.volume);

    stage
        .play_file(&mut graph, &WavLoader::new(), &args.input)
        .await
        .with_context(|| format!("failed to play {}", args.input.display()))?;
    if args.looping {
        stage.set_loop(&mut graph, true);
    }

    println!("Input:   {}", args.input.display());
    println!("Length:  {:.2} s", stage.duration().as_secs_f64());
    println!(
        "Board:   {} ({} pedals, {} skipped)",
        preset.name.as_deref().unwrap_or(&args.preset),
        report.loaded,
        report.skipped.len()
    );
    println!("Volume:  {:.2}", stage.volume());
    println!("Looping: {}", stage.input().is_looping());

    let reaches = graph.reachable(stage.input().output(), graph.destination());
    println!(
        "Route:   input -> board -> master -> destination {}",
        if reaches { "ok" } else { "BROKEN" }
    );

    stage.dispose(&mut graph);
    Ok(())
}
