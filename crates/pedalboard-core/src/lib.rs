//! Pedalboard Core - signal-chain primitives for a guitar pedal board
//!
//! This crate holds everything below the individual pedal: the contract with
//! the host audio engine, the chain model that wires primitives together, and
//! the controls (pots, switches, LEDs) a pedal exposes.
//!
//! # Host Engine
//!
//! - [`AudioHost`] - Control-side interface to the engine that owns the samples
//! - [`HostExt`] - Convenience constructors and logged wiring helpers
//! - [`SignalGraph`] - In-memory host that records topology, used by tests and tooling
//!
//! # Routing
//!
//! - [`ChainModel`] - Input → effects → output with an explicit downstream target
//! - [`BypassRoute`] - One `(active, input, bypass)` row of a switch's routing table
//!
//! # Controls
//!
//! - [`Pot`] - Normalized position → value through a [`PotCurve`]
//! - [`Switch`] - Latching or momentary footswitch
//! - [`Led`] - Follows a switch
//!
//! # Threading
//!
//! The control path is single-threaded. Every mutation runs to completion
//! before the next one starts; the host engine processes audio on its own
//! thread and only sees the resulting topology.
//!
//! # Example
//!
//! ```rust
//! use pedalboard_core::{ChainModel, HostExt, SignalGraph, AudioHost};
//!
//! let mut graph = SignalGraph::new(48000.0);
//! let gain = graph.create_gain(0.5);
//! let mut chain = ChainModel::new(&mut graph).with_effects(vec![gain]);
//! let out = graph.destination();
//! chain.connect(&mut graph, out);
//!
//! assert!(graph.reachable(chain.input(), out));
//! ```

pub mod chain;
pub mod graph;
pub mod host;
pub mod led;
pub mod pot;
pub mod switch;

pub use chain::ChainModel;
pub use graph::{Edge, Playback, SignalGraph};
pub use host::{
    AudioBuffer, AudioHost, FilterType, HostError, HostExt, NodeId, Oversample, ParamKind,
    PrimitiveKind,
};
pub use led::Led;
pub use pot::{Pot, PotChange, PotConfig, PotCurve};
pub use switch::{
    BypassRoute, DEFAULT_RELEASE_AFTER, Switch, SwitchConfig, SwitchEvent, SwitchKind,
};
