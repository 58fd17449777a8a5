//! Board topology printer.
//!
//! Loads a preset onto an in-memory graph and prints every edge, then the
//! route through the pedals from board input to the destination.

use clap::Args;
use pedalboard_config::Board;
use pedalboard_core::{AudioHost, SignalGraph};
use pedalboard_registry::PedalRegistry;

use super::common::{GRAPH_SAMPLE_RATE, load_preset, node_label};

#[derive(Args)]
pub struct TopologyArgs {
    /// Preset name or path
    preset: String,

    /// Engage or bypass every pedal before printing
    #[arg(long, value_name = "on|off")]
    all: Option<AllPedals>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum AllPedals {
    On,
    Off,
}

pub fn run(args: TopologyArgs) -> anyhow::Result<()> {
    let preset = load_preset(&args.preset)?;
    let registry = PedalRegistry::new();

    let mut graph = SignalGraph::new(GRAPH_SAMPLE_RATE);
    let mut board = Board::new(&mut graph);
    let destination = graph.destination();
    board.connect(&mut graph, destination);

    let report = board.deserialize(&mut graph, &preset, &registry)?;
    for name in &report.skipped {
        println!("skipped unknown pedal '{}'", name);
    }

    if let Some(all) = args.all {
        let bypassed = matches!(all, AllPedals::Off);
        for index in 0..board.len() {
            if let Some(pedal) = board.pedal_at_mut(index) {
                pedal.set_bypass(&mut graph, bypassed);
            }
        }
    }

    println!("Board: {}", preset.name.as_deref().unwrap_or(&args.preset));
    println!();
    println!("Pedals:");
    for (i, pedal) in board.pedals().iter().enumerate() {
        let state = if pedal.is_bypassed() { "bypassed" } else { "engaged" };
        println!(
            "  {}. {:10} {:8}  in {}  out {}",
            i + 1,
            pedal.name(),
            state,
            pedal.input(),
            pedal.output()
        );
    }
    println!();

    println!("Edges ({}):", graph.edges().len());
    let mut edges = graph.edges().to_vec();
    edges.sort_by_key(|e| (e.from, e.to));
    for edge in edges {
        println!(
            "  {:20} -> {}",
            node_label(&graph, edge.from),
            node_label(&graph, edge.to)
        );
    }
    println!();

    // Hop between pedal boundaries; inside an engaged kernel the graph may branch.
    println!("Signal path:");
    let mut stops = vec![("board in".to_string(), board.input())];
    for pedal in board.pedals() {
        stops.push((format!("{} in", pedal.name()), pedal.input()));
        stops.push((format!("{} out", pedal.name()), pedal.output()));
    }
    stops.push(("board out".to_string(), board.output()));
    stops.push(("destination".to_string(), destination));

    for pair in stops.windows(2) {
        let (from_name, from) = &pair[0];
        let (to_name, to) = &pair[1];
        let via = match graph.linear_path(*from, *to) {
            Some(path) if path.len() > 2 => format!(" via {} nodes", path.len() - 2),
            Some(_) => String::new(),
            None if graph.reachable(*from, *to) => " (branches)".to_string(),
            None => " (BROKEN)".to_string(),
        };
        println!("  {} -> {}{}", from_name, to_name, via);
    }

    board.dispose(&mut graph);
    Ok(())
}
