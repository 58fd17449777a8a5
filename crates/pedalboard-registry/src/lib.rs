//! Pedal registry and factory for pedalboard.
//!
//! This crate provides a centralized registry for discovering and building
//! pedals by name. Preset loading goes through it: a preset entry's `name`
//! is looked up here and the factory builds a fresh [`EffectUnit`] on the
//! host.
//!
//! # Features
//!
//! - **Pedal Discovery**: List all available pedals with metadata
//! - **Factory Pattern**: Build pedals by name at runtime
//! - **Category System**: Pedals organized by role (drive, time, ...)
//! - **Extensible**: Register custom pedals next to the built-ins
//!
//! # Example
//!
//! ```rust
//! use pedalboard_core::SignalGraph;
//! use pedalboard_registry::{PedalCategory, PedalRegistry};
//!
//! let registry = PedalRegistry::new();
//! let mut graph = SignalGraph::new(48000.0);
//!
//! for pedal in registry.all_pedals() {
//!     println!("{}: {}", pedal.name, pedal.description);
//! }
//!
//! let overdrive = registry.create(&mut graph, "overdrive").unwrap();
//! assert_eq!(overdrive.name(), "overdrive");
//!
//! assert_eq!(registry.pedals_in_category(PedalCategory::Drive).len(), 1);
//! ```

use pedalboard_core::AudioHost;
use pedalboard_effects::{Cabinet, Delay, EffectUnit, Kernel, Overdrive, PedalKind, Reverb};
use serde::Serialize;

/// Role of a pedal on the board, for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PedalCategory {
    /// Overdrive, distortion, boost
    Drive,
    /// Delay and echo
    Time,
    /// Reverb and room
    Ambience,
    /// EQ and cabinet simulation
    Tone,
    /// Volume and other utility pedals
    Utility,
}

impl PedalCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Drive,
        Self::Time,
        Self::Ambience,
        Self::Tone,
        Self::Utility,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            PedalCategory::Drive => "Drive",
            PedalCategory::Time => "Time",
            PedalCategory::Ambience => "Ambience",
            PedalCategory::Tone => "Tone",
            PedalCategory::Utility => "Utility",
        }
    }
}

/// Describes a pedal in the registry.
#[derive(Debug, Clone, Serialize)]
pub struct PedalDescriptor {
    /// Preset key (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the pedal.
    pub description: &'static str,
    /// Category for organization.
    pub category: PedalCategory,
    /// Pot names in panel order, level first.
    pub pot_names: &'static [&'static str],
}

/// Factory function type for building pedals.
pub type PedalFactory = fn(&mut dyn AudioHost) -> EffectUnit;

struct RegistryEntry {
    descriptor: PedalDescriptor,
    factory: PedalFactory,
}

/// Registry of available pedals.
///
/// Ids are unique: registering an id again replaces the earlier entry, so
/// callers can override a built-in with their own voicing.
pub struct PedalRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for PedalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PedalRegistry {
    /// Create a registry with the built-in pedals registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_pedals();
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(PedalKind::BUILT_IN.len()),
        }
    }

    fn register_builtin_pedals(&mut self) {
        self.register(
            PedalDescriptor {
                id: "overdrive",
                name: "Overdrive",
                description: "Oversampled wave-shaper drive with a lowpass tone control",
                category: PedalCategory::Drive,
                pot_names: &["level", "drive", "tone"],
            },
            |host| {
                let kernel = Kernel::Overdrive(Overdrive::new(host));
                EffectUnit::new(host, kernel)
            },
        );

        self.register(
            PedalDescriptor {
                id: "delay",
                name: "Delay",
                description: "Feedback delay up to two seconds with wet/dry mix",
                category: PedalCategory::Time,
                pot_names: &["level", "time", "feedback", "mix"],
            },
            |host| {
                let kernel = Kernel::Delay(Delay::new(host));
                EffectUnit::new(host, kernel)
            },
        );

        self.register(
            PedalDescriptor {
                id: "reverb",
                name: "Reverb",
                description: "Convolution reverb over a synthesized room response",
                category: PedalCategory::Ambience,
                pot_names: &["level", "room", "mix", "tone"],
            },
            |host| {
                let kernel = Kernel::Reverb(Reverb::new(host));
                EffectUnit::new(host, kernel)
            },
        );

        self.register(
            PedalDescriptor {
                id: "cabinet",
                name: "Cabinet",
                description: "Speaker cabinet EQ with vintage, modern and british voicings",
                category: PedalCategory::Tone,
                pot_names: &["level", "cabinet", "bass", "mid", "treble", "presence"],
            },
            |host| {
                let kernel = Kernel::Cabinet(Cabinet::new(host));
                EffectUnit::new(host, kernel)
            },
        );

        self.register(
            PedalDescriptor {
                id: "volume",
                name: "Volume",
                description: "Level control, engaged by default",
                category: PedalCategory::Utility,
                pot_names: &["level"],
            },
            |host| EffectUnit::new(host, Kernel::Volume),
        );
    }

    /// Register a pedal, replacing any entry with the same id.
    pub fn register(&mut self, descriptor: PedalDescriptor, factory: PedalFactory) {
        let entry = RegistryEntry {
            descriptor,
            factory,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.id == entry.descriptor.id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Returns descriptors for all registered pedals.
    pub fn all_pedals(&self) -> Vec<&PedalDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for pedals in a specific category.
    pub fn pedals_in_category(&self, category: PedalCategory) -> Vec<&PedalDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by pedal id.
    pub fn get(&self, id: &str) -> Option<&PedalDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Build a pedal by id on `host`.
    ///
    /// Returns `None` if the id is not registered.
    pub fn create(&self, host: &mut dyn AudioHost, id: &str) -> Option<EffectUnit> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| (e.factory)(host))
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of registered pedals.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no pedals are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::{HostExt, ParamKind, Pot, SignalGraph};
    use pedalboard_effects::CustomKernel;

    #[test]
    fn test_registry_creation() {
        let registry = PedalRegistry::new();
        assert_eq!(registry.len(), 5);
        assert!(PedalRegistry::empty().is_empty());
    }

    #[test]
    fn test_get_pedal() {
        let registry = PedalRegistry::new();

        let delay = registry.get("delay");
        assert!(delay.is_some());
        assert_eq!(delay.unwrap().name, "Delay");

        assert!(registry.get("fuzz").is_none());
    }

    #[test]
    fn test_create_pedal() {
        let registry = PedalRegistry::new();
        let mut graph = SignalGraph::new(8000.0);

        let unit = registry.create(&mut graph, "volume").unwrap();
        assert_eq!(unit.kind(), PedalKind::Volume);
        assert!(!unit.is_bypassed());

        assert!(registry.create(&mut graph, "fuzz").is_none());
    }

    #[test]
    fn test_pot_names_match_built_units() {
        let registry = PedalRegistry::new();
        let mut graph = SignalGraph::new(8000.0);

        for descriptor in registry.all_pedals() {
            let unit = registry.create(&mut graph, descriptor.id).unwrap();
            assert_eq!(unit.name(), descriptor.id);
            let names: Vec<_> = unit.pots().map(Pot::name).collect();
            assert_eq!(names, descriptor.pot_names, "pots of {}", descriptor.id);
        }
    }

    #[test]
    fn test_pedals_by_category() {
        let registry = PedalRegistry::new();
        for category in PedalCategory::ALL {
            assert_eq!(registry.pedals_in_category(category).len(), 1);
        }
    }

    #[test]
    fn test_register_custom_and_override() {
        let mut registry = PedalRegistry::new();
        registry.register(
            PedalDescriptor {
                id: "boost",
                name: "Clean Boost",
                description: "Single gain stage",
                category: PedalCategory::Drive,
                pot_names: &["level", "gain"],
            },
            |host| {
                let gain = host.create_gain(1.0);
                let kernel = CustomKernel::builder("boost")
                    .node(gain)
                    .pot(Pot::linear("gain", 0.0, 4.0, 1.0), gain, ParamKind::Gain)
                    .build();
                EffectUnit::new(host, Kernel::Custom(kernel))
            },
        );
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.pedals_in_category(PedalCategory::Drive).len(), 2);

        let mut graph = SignalGraph::new(8000.0);
        let boost = registry.create(&mut graph, "boost").unwrap();
        assert_eq!(boost.name(), "boost");

        registry.register(
            PedalDescriptor {
                id: "volume",
                name: "Volume (engaged off)",
                description: "Volume pedal that starts bypassed",
                category: PedalCategory::Utility,
                pot_names: &["level"],
            },
            |host| EffectUnit::with_bypassed(host, Kernel::Volume, true),
        );
        assert_eq!(registry.len(), 6);
        assert!(registry.create(&mut graph, "volume").unwrap().is_bypassed());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(PedalCategory::Drive.name(), "Drive");
        assert_eq!(PedalCategory::Ambience.name(), "Ambience");
    }
}
