//! Preset management commands.
//!
//! Lists, shows, validates and copies board presets.

use anyhow::Context;
use clap::{Args, Subcommand};
use pedalboard_config::{
    BoardPreset, FACTORY_PRESET_NAMES, ensure_user_presets_dir, get_factory_preset,
    list_user_presets, preset_name_from_path, user_presets_dir,
};
use pedalboard_registry::PedalRegistry;

use super::common::load_preset;

#[derive(Args)]
pub struct PresetArgs {
    #[command(subcommand)]
    command: PresetCommand,
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List available presets (factory and user)
    List,

    /// Show the pedals of a preset
    Show {
        /// Preset name or path
        name: String,

        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Check a preset for structural problems and unknown pedals
    Validate {
        /// Preset name or path
        name: String,
    },

    /// Copy a factory preset into the user presets directory
    Copy {
        /// Factory preset name
        source: String,

        /// New preset name (defaults to the source name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the user presets directory
    Paths,
}

pub fn run(args: PresetArgs) -> anyhow::Result<()> {
    match args.command {
        PresetCommand::List => list_presets(),
        PresetCommand::Show { name, json } => show_preset(&name, json),
        PresetCommand::Validate { name } => validate(&name),
        PresetCommand::Copy { source, name } => copy_preset(&source, name.as_deref()),
        PresetCommand::Paths => {
            println!("User presets: {}", user_presets_dir().display());
            Ok(())
        }
    }
}

fn list_presets() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for name in FACTORY_PRESET_NAMES {
        let description = get_factory_preset(name)
            .and_then(|p| p.description)
            .unwrap_or_default();
        println!("  {:16} - {}", name, description);
    }
    println!();

    println!("User Presets:");
    println!("=============");
    let user_presets = list_user_presets();
    if user_presets.is_empty() {
        println!("  (none)");
    }
    for path in user_presets {
        let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
        match BoardPreset::load(&path) {
            Ok(preset) => {
                let description = preset.description.unwrap_or_default();
                println!("  {:16} - {}", name, description);
            }
            Err(_) => println!("  {:16} - (error loading)", name),
        }
    }
    println!();

    Ok(())
}

fn show_preset(name: &str, json: bool) -> anyhow::Result<()> {
    let preset = load_preset(name)?;

    if json {
        println!("{}", preset.to_json()?);
        return Ok(());
    }

    let title = preset.name.as_deref().unwrap_or(name);
    println!("Preset: {}", title);
    println!("{}", "=".repeat(8 + title.len()));
    println!();

    if let Some(description) = &preset.description {
        println!("Description: {}", description);
        println!();
    }

    println!("Pedals ({}):", preset.len());
    for (i, pedal) in preset.pedals.iter().enumerate() {
        let marker = if pedal.bypassed { " [BYPASSED]" } else { "" };
        println!("  {}. {}{}", i + 1, pedal.name, marker);
        for pot in &pedal.pots {
            println!("      {} = {}", pot.name, pot.value);
        }
    }

    Ok(())
}

fn validate(name: &str) -> anyhow::Result<()> {
    let preset = load_preset(name)?;
    preset
        .validate()
        .with_context(|| format!("preset '{}' is invalid", name))?;

    let registry = PedalRegistry::new();
    let mut warnings = 0;
    for pedal in &preset.pedals {
        let Some(descriptor) = registry.get(&pedal.name) else {
            println!("warning: unknown pedal '{}' will be skipped", pedal.name);
            warnings += 1;
            continue;
        };
        for pot in &pedal.pots {
            if !descriptor.pot_names.contains(&pot.name.as_str()) {
                println!(
                    "warning: pedal '{}' has no pot '{}'",
                    pedal.name, pot.name
                );
                warnings += 1;
            }
        }
    }

    if warnings == 0 {
        println!("Preset '{}' is valid ({} pedals).", name, preset.len());
    } else {
        println!(
            "Preset '{}' loads with {} warning(s).",
            name, warnings
        );
    }
    Ok(())
}

fn copy_preset(source: &str, new_name: Option<&str>) -> anyhow::Result<()> {
    let preset = get_factory_preset(source)
        .ok_or_else(|| anyhow::anyhow!("Factory preset '{}' not found.", source))?;

    let target_name = new_name.unwrap_or(source);
    let dir = ensure_user_presets_dir()?;
    let path = dir.join(format!("{}.json", target_name));

    if path.exists() {
        anyhow::bail!(
            "Preset '{}' already exists in user presets. Choose a different name with --name.",
            target_name
        );
    }

    let mut copy = BoardPreset::new(target_name);
    if let Some(description) = &preset.description {
        copy = copy.with_description(format!("{} (copy)", description));
    }
    for pedal in preset.pedals {
        copy = copy.with_pedal(pedal);
    }
    copy.save(&path)?;

    println!("Copied '{}' to {}", source, path.display());
    Ok(())
}
