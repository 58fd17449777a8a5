//! The closed set of pedal kernels and the controls they respond to.
//!
//! [`Kernel`] is a tagged variant over every pedal type. The effect unit talks
//! to it through one uniform surface (nodes, entry points, pots, `apply`) and
//! never needs to know which pedal it is wrapping.

use std::fmt;

use pedalboard_core::{AudioHost, NodeId, ParamKind, Pot, Switch};
use serde::{Deserialize, Serialize};

use crate::cabinet::Cabinet;
use crate::custom::CustomKernel;
use crate::delay::Delay;
use crate::overdrive::Overdrive;
use crate::reverb::Reverb;

/// What a pot drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Shared output level, 0–10.
    Level,
    /// Overdrive drive, 0–10.
    Drive,
    /// Overdrive tone, 0–10.
    Tone,
    /// Delay time in seconds.
    Time,
    /// Delay feedback gain.
    Feedback,
    /// Wet/dry balance, 0–1 (delay and reverb).
    Mix,
    /// Reverb room size, 0–10.
    Room,
    /// Reverb brightness, 0–10.
    Brightness,
    /// Cabinet voicing index.
    CabinetType,
    /// Cabinet low shelf, 0–10.
    Bass,
    /// Cabinet mid peak, 0–10.
    Mid,
    /// Cabinet high shelf, 0–10.
    Treble,
    /// Cabinet lowpass corner, 0–10.
    Presence,
    /// Direct write of `offset + value·scale` to a primitive parameter.
    Param {
        /// Target primitive.
        node: NodeId,
        /// Target parameter.
        param: ParamKind,
        /// Multiplier applied to the pot value.
        scale: f32,
        /// Added after scaling.
        offset: f32,
    },
}

/// Pedal type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PedalKind {
    /// Wave-shaper overdrive.
    Overdrive,
    /// Feedback delay.
    Delay,
    /// Convolution reverb.
    Reverb,
    /// Speaker cabinet EQ.
    Cabinet,
    /// Level-only utility pedal.
    Volume,
    /// User-assembled pedal.
    Custom,
}

impl PedalKind {
    /// Built-in kinds, excluding [`PedalKind::Custom`].
    pub const BUILT_IN: [Self; 5] = [
        Self::Overdrive,
        Self::Delay,
        Self::Reverb,
        Self::Cabinet,
        Self::Volume,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Overdrive => "overdrive",
            Self::Delay => "delay",
            Self::Reverb => "reverb",
            Self::Cabinet => "cabinet",
            Self::Volume => "volume",
            Self::Custom => "custom",
        }
    }

    /// Parses a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "overdrive" => Some(Self::Overdrive),
            "delay" => Some(Self::Delay),
            "reverb" => Some(Self::Reverb),
            "cabinet" => Some(Self::Cabinet),
            "volume" => Some(Self::Volume),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Whether a freshly built pedal of this kind starts bypassed.
    ///
    /// Effect pedals start bypassed; the volume pedal starts engaged.
    pub fn default_bypassed(self) -> bool {
        !matches!(self, Self::Volume)
    }
}

impl fmt::Display for PedalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-pedal-type primitives and synthesis state.
#[derive(Debug)]
pub enum Kernel {
    /// See [`Overdrive`].
    Overdrive(Overdrive),
    /// See [`Delay`].
    Delay(Delay),
    /// See [`Reverb`].
    Reverb(Reverb),
    /// See [`Cabinet`].
    Cabinet(Cabinet),
    /// No primitives beyond the shared level stage.
    Volume,
    /// See [`CustomKernel`].
    Custom(CustomKernel),
}

impl Kernel {
    /// Builds the kernel for a built-in pedal kind.
    ///
    /// Returns `None` for [`PedalKind::Custom`], which needs a builder.
    pub fn build(host: &mut dyn AudioHost, kind: PedalKind) -> Option<Self> {
        Some(match kind {
            PedalKind::Overdrive => Self::Overdrive(Overdrive::new(host)),
            PedalKind::Delay => Self::Delay(Delay::new(host)),
            PedalKind::Reverb => Self::Reverb(Reverb::new(host)),
            PedalKind::Cabinet => Self::Cabinet(Cabinet::new(host)),
            PedalKind::Volume => Self::Volume,
            PedalKind::Custom => return None,
        })
    }

    /// Pedal type tag.
    pub fn kind(&self) -> PedalKind {
        match self {
            Self::Overdrive(_) => PedalKind::Overdrive,
            Self::Delay(_) => PedalKind::Delay,
            Self::Reverb(_) => PedalKind::Reverb,
            Self::Cabinet(_) => PedalKind::Cabinet,
            Self::Volume => PedalKind::Volume,
            Self::Custom(_) => PedalKind::Custom,
        }
    }

    /// Pedal name, used as the preset key.
    pub fn name(&self) -> &str {
        match self {
            Self::Custom(custom) => custom.name(),
            other => other.kind().name(),
        }
    }

    /// Whether a unit wrapping this kernel starts bypassed.
    pub fn default_bypassed(&self) -> bool {
        match self {
            Self::Custom(custom) => custom.default_bypassed(),
            other => other.kind().default_bypassed(),
        }
    }

    /// Kernel primitives in signal order, excluding the level stage.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Self::Overdrive(k) => k.nodes(),
            Self::Delay(k) => k.nodes(),
            Self::Reverb(k) => k.nodes(),
            Self::Cabinet(k) => k.nodes(),
            Self::Volume => Vec::new(),
            Self::Custom(k) => k.nodes().to_vec(),
        }
    }

    /// Nodes fed by the unit input while engaged.
    ///
    /// Empty means the first series node, or the level stage if there is none.
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        match self {
            Self::Delay(k) => k.entry_nodes(),
            Self::Reverb(k) => k.entry_nodes(),
            other => other.nodes().into_iter().take(1).collect(),
        }
    }

    /// Explicit wiring for kernels that are not a straight series chain.
    pub fn internal_edges(&self, input: NodeId, level: NodeId) -> Option<Vec<(NodeId, NodeId)>> {
        match self {
            Self::Delay(k) => Some(k.internal_edges(input, level)),
            Self::Reverb(k) => Some(k.internal_edges(input, level)),
            _ => None,
        }
    }

    /// Creates the kernel's pots at their default positions.
    pub(crate) fn take_pots(&mut self) -> Vec<(Pot, Control)> {
        match self {
            Self::Overdrive(_) => Overdrive::pots(),
            Self::Delay(_) => Delay::pots(),
            Self::Reverb(_) => Reverb::pots(),
            Self::Cabinet(_) => Cabinet::pots(),
            Self::Volume => Vec::new(),
            Self::Custom(k) => k.take_pots(),
        }
    }

    pub(crate) fn take_switches(&mut self) -> Vec<Switch> {
        match self {
            Self::Custom(k) => k.take_switches(),
            _ => Vec::new(),
        }
    }

    /// Applies a pot value to the kernel's primitives.
    pub fn apply(&mut self, host: &mut dyn AudioHost, control: Control, value: f32) {
        match self {
            Self::Overdrive(k) => k.apply(host, control, value),
            Self::Delay(k) => k.apply(host, control, value),
            Self::Reverb(k) => k.apply(host, control, value),
            Self::Cabinet(k) => k.apply(host, control, value),
            Self::Volume => tracing::debug!(?control, "volume has no kernel controls"),
            Self::Custom(k) => k.apply(host, control, value),
        }
    }
}
