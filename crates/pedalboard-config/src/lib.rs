//! Board orchestration and preset management for pedalboard.
//!
//! # Features
//!
//! - **Board**: Ordered pedal sequence with one full recompute per mutation
//! - **Presets**: JSON documents listing pedals, bypass flags and pot values
//! - **Validation**: Malformed documents are rejected before the board changes
//! - **Factory Presets**: Built-in boards that need no files
//! - **Paths**: Platform-specific user preset directory
//!
//! # Example
//!
//! ```rust
//! use pedalboard_config::{Board, get_factory_preset};
//! use pedalboard_core::{AudioHost, SignalGraph};
//! use pedalboard_registry::PedalRegistry;
//!
//! let mut graph = SignalGraph::new(48000.0);
//! let registry = PedalRegistry::new();
//! let mut board = Board::new(&mut graph);
//! let out = graph.destination();
//! board.connect(&mut graph, out);
//!
//! let preset = get_factory_preset("crunch").unwrap();
//! let report = board.deserialize(&mut graph, &preset, &registry).unwrap();
//! assert_eq!(report.loaded, 3);
//! assert!(graph.reachable(board.input(), out));
//! ```

mod board;
mod error;
mod preset;

/// Platform-specific preset paths.
pub mod paths;

/// Preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use board::{Board, BoardEvent, LoadReport, PedalSource};
pub use error::{ConfigError, Result};
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_presets, get_factory_preset, is_factory_preset,
};
pub use paths::{
    ensure_user_presets_dir, find_preset, list_user_presets, preset_name_from_path,
    user_presets_dir,
};
pub use preset::{BoardPreset, PedalPreset, PotPreset};
pub use validation::{ValidationError, ValidationResult, validate_preset};

/// Re-export commonly used types from pedalboard-registry
pub use pedalboard_registry::{PedalCategory, PedalDescriptor, PedalRegistry};
