//! Pedal listing and information command.

use clap::Args;
use pedalboard_core::{PotCurve, SignalGraph};
use pedalboard_registry::{PedalCategory, PedalRegistry};

use super::common::GRAPH_SAMPLE_RATE;

#[derive(Args)]
pub struct PedalsArgs {
    /// Show details for a specific pedal
    #[arg(value_name = "PEDAL")]
    pedal: Option<String>,

    /// Print descriptors as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PedalsArgs) -> anyhow::Result<()> {
    let registry = PedalRegistry::new();

    if let Some(id) = &args.pedal {
        return show_pedal(&registry, id, args.json);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&registry.all_pedals())?);
        return Ok(());
    }

    println!("Available Pedals:");
    println!("=================");
    for category in PedalCategory::ALL {
        let pedals = registry.pedals_in_category(category);
        if pedals.is_empty() {
            continue;
        }
        println!();
        println!("{}:", category.name());
        for pedal in pedals {
            println!("  {:12} - {}", pedal.id, pedal.description);
        }
    }
    println!();
    println!("Use 'pedalboard pedals <PEDAL>' for pot details.");

    Ok(())
}

fn show_pedal(registry: &PedalRegistry, id: &str, json: bool) -> anyhow::Result<()> {
    let descriptor = registry
        .get(&id.to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Unknown pedal: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(descriptor)?);
        return Ok(());
    }

    // Build one to read live pot ranges and defaults.
    let mut graph = SignalGraph::new(GRAPH_SAMPLE_RATE);
    let unit = registry
        .create(&mut graph, descriptor.id)
        .ok_or_else(|| anyhow::anyhow!("Pedal '{}' failed to build", id))?;

    println!("{}", descriptor.name);
    println!("{}", "=".repeat(descriptor.name.len()));
    println!();
    println!("{}", descriptor.description);
    println!();
    println!(
        "Starts {}.",
        if unit.is_bypassed() { "bypassed" } else { "engaged" }
    );
    println!();
    println!("Pots:");
    println!();
    println!("  {:10}  {:12}  {:10}  {}", "Name", "Curve", "Default", "Range");
    println!("  {:10}  {:12}  {:10}  {}", "----", "-----", "-------", "-----");
    for pot in unit.pots() {
        let range = match pot.curve() {
            PotCurve::Selector(options) => options.join(" | "),
            _ => format!("{} - {}", pot.min(), pot.max()),
        };
        let default = pot
            .selected()
            .map_or_else(|| format!("{:.2}", pot.value()), str::to_string);
        println!(
            "  {:10}  {:12}  {:10}  {}",
            pot.name(),
            pot.curve().label(),
            default,
            range
        );
    }

    Ok(())
}
