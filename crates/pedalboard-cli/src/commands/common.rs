//! Helpers shared across commands.

use anyhow::Context;
use pedalboard_config::{BoardPreset, find_preset, get_factory_preset};
use pedalboard_core::{NodeId, SignalGraph};

/// Sample rate of the in-memory graph the commands build boards on.
pub const GRAPH_SAMPLE_RATE: f32 = 48000.0;

/// Resolves a factory preset name, a user preset name, or a file path.
pub fn load_preset(name: &str) -> anyhow::Result<BoardPreset> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }

    let path = find_preset(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Preset '{}' not found. Use 'pedalboard preset list' to see available presets.",
            name
        )
    })?;
    BoardPreset::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

/// `#id kind` label for a node.
pub fn node_label(graph: &SignalGraph, node: NodeId) -> String {
    match graph.kind(node) {
        Some(kind) => format!("{node} {}", kind.label()),
        None => format!("{node} (released)"),
    }
}
