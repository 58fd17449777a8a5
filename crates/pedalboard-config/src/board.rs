//! The board: an ordered sequence of pedals between two gain stages.
//!
//! Every structural mutation (add, remove, move, clear, preset load) changes
//! the sequence first and then runs one full recompute:
//!
//! ```text
//! empty:     input → output → downstream / media sink
//! non-empty: input → p0 → p1 → … → pN → output → downstream / media sink
//! ```
//!
//! Pedals keep their own bypass wiring; the board only hands each one its
//! downstream target.

use pedalboard_core::{AudioHost, HostExt, NodeId};
use pedalboard_effects::{EffectUnit, UnitId};
use pedalboard_registry::PedalRegistry;

use crate::error::Result;
use crate::preset::{BoardPreset, PedalPreset, PotPreset};

/// Builds pedals by name while a preset loads.
///
/// Implemented for [`PedalRegistry`] and for any
/// `Fn(&mut dyn AudioHost, &str) -> Option<EffectUnit>`.
pub trait PedalSource {
    /// Builds the pedal called `name`, or `None` if it is unknown.
    fn build(&self, host: &mut dyn AudioHost, name: &str) -> Option<EffectUnit>;
}

impl PedalSource for PedalRegistry {
    fn build(&self, host: &mut dyn AudioHost, name: &str) -> Option<EffectUnit> {
        self.create(host, name)
    }
}

impl<F> PedalSource for F
where
    F: Fn(&mut dyn AudioHost, &str) -> Option<EffectUnit>,
{
    fn build(&self, host: &mut dyn AudioHost, name: &str) -> Option<EffectUnit> {
        self(host, name)
    }
}

/// Board notifications, emitted after the topology has settled.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// A pedal was inserted.
    PedalAdded {
        /// Position in the sequence.
        index: usize,
        /// Unit identity.
        id: UnitId,
        /// Pedal name.
        name: String,
    },
    /// A pedal was taken off the board.
    PedalRemoved {
        /// Unit identity.
        id: UnitId,
        /// Pedal name.
        name: String,
    },
    /// A pedal changed position.
    PedalMoved {
        /// Old position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// The board was rewired.
    TopologyChanged,
    /// A preset finished loading.
    PresetLoaded {
        /// Number of pedals built.
        loaded: usize,
        /// Names that no factory knew.
        skipped: Vec<String>,
    },
}

/// Outcome of a preset load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of pedals placed on the board.
    pub loaded: usize,
    /// Entries skipped because no pedal of that name exists.
    pub skipped: Vec<String>,
}

type BoardListener = Box<dyn FnMut(&BoardEvent)>;

/// Hosts pedals and keeps them wired in order.
pub struct Board {
    input: NodeId,
    output: NodeId,
    downstream: Option<NodeId>,
    media_sink: Option<NodeId>,
    pedals: Vec<EffectUnit>,
    listeners: Vec<BoardListener>,
    disposed: bool,
}

impl Board {
    /// Creates an empty board with input wired straight to output.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let mut board = Self {
            input: host.create_gain(1.0),
            output: host.create_gain(1.0),
            downstream: None,
            media_sink: None,
            pedals: Vec::new(),
            listeners: Vec::new(),
            disposed: false,
        };
        board.recompute(host);
        board
    }

    /// Board input node.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Board output node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Where the board output goes, if connected.
    pub fn downstream(&self) -> Option<NodeId> {
        self.downstream
    }

    /// Routes the board output into `destination`.
    pub fn connect(&mut self, host: &mut dyn AudioHost, destination: NodeId) {
        if self.disposed {
            return;
        }
        self.downstream = Some(destination);
        self.recompute(host);
    }

    /// Unhooks the board output and forgets the downstream target.
    ///
    /// A media sink, if set, stays connected.
    pub fn disconnect(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.downstream = None;
        self.recompute(host);
    }

    /// Taps the board output into a stream sink as well as the downstream.
    pub fn set_media_sink(&mut self, host: &mut dyn AudioHost, sink: NodeId) {
        if self.disposed {
            return;
        }
        self.media_sink = Some(sink);
        self.recompute(host);
    }

    // --- sequence ---

    /// Appends a pedal.
    pub fn add_pedal(&mut self, host: &mut dyn AudioHost, pedal: EffectUnit) {
        let index = self.pedals.len();
        self.add_pedal_at(host, pedal, index);
    }

    /// Inserts a pedal at `index`, clamped to the board length.
    pub fn add_pedal_at(&mut self, host: &mut dyn AudioHost, mut pedal: EffectUnit, index: usize) {
        if self.disposed {
            pedal.dispose(host);
            return;
        }
        let index = index.min(self.pedals.len());
        let (id, name) = (pedal.id(), pedal.name().to_string());
        self.pedals.insert(index, pedal);
        self.recompute(host);
        tracing::debug!(pedal = %name, index, "pedal added");
        self.emit(&BoardEvent::PedalAdded { index, id, name });
    }

    /// Appends several pedals with a single recompute.
    pub fn add_pedals(
        &mut self,
        host: &mut dyn AudioHost,
        pedals: impl IntoIterator<Item = EffectUnit>,
    ) {
        if self.disposed {
            for mut pedal in pedals {
                pedal.dispose(host);
            }
            return;
        }
        let start = self.pedals.len();
        self.pedals.extend(pedals);
        self.recompute(host);
        let added: Vec<BoardEvent> = self.pedals[start..]
            .iter()
            .enumerate()
            .map(|(offset, pedal)| BoardEvent::PedalAdded {
                index: start + offset,
                id: pedal.id(),
                name: pedal.name().to_string(),
            })
            .collect();
        for event in &added {
            self.emit(event);
        }
    }

    /// Takes a pedal off the board by identity and hands it back.
    pub fn remove_pedal(&mut self, host: &mut dyn AudioHost, id: UnitId) -> Option<EffectUnit> {
        let index = self.position(id)?;
        self.remove_pedal_at(host, index)
    }

    /// Takes the pedal at `index` off the board and hands it back.
    ///
    /// The returned unit is disconnected but not disposed.
    pub fn remove_pedal_at(
        &mut self,
        host: &mut dyn AudioHost,
        index: usize,
    ) -> Option<EffectUnit> {
        if self.disposed || index >= self.pedals.len() {
            return None;
        }
        let mut pedal = self.pedals.remove(index);
        pedal.disconnect(host);
        self.recompute(host);
        tracing::debug!(pedal = pedal.name(), index, "pedal removed");
        self.emit(&BoardEvent::PedalRemoved {
            id: pedal.id(),
            name: pedal.name().to_string(),
        });
        Some(pedal)
    }

    /// Moves a pedal. Out-of-range indices leave the board untouched.
    pub fn move_pedal(&mut self, host: &mut dyn AudioHost, from: usize, to: usize) -> bool {
        let len = self.pedals.len();
        if self.disposed || from >= len || to >= len {
            return false;
        }
        let pedal = self.pedals.remove(from);
        self.pedals.insert(to, pedal);
        self.recompute(host);
        self.emit(&BoardEvent::PedalMoved { from, to });
        true
    }

    /// Disposes every pedal and leaves input wired to output.
    pub fn clear(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.dispose_pedals(host);
        self.recompute(host);
    }

    // --- access ---

    /// Pedals in signal order.
    pub fn pedals(&self) -> &[EffectUnit] {
        &self.pedals
    }

    /// Pedal at `index`.
    pub fn pedal_at(&self, index: usize) -> Option<&EffectUnit> {
        self.pedals.get(index)
    }

    /// Mutable pedal at `index`.
    pub fn pedal_at_mut(&mut self, index: usize) -> Option<&mut EffectUnit> {
        self.pedals.get_mut(index)
    }

    /// Mutable pedal by identity.
    pub fn pedal_mut(&mut self, id: UnitId) -> Option<&mut EffectUnit> {
        self.pedals.iter_mut().find(|p| p.id() == id)
    }

    /// Position of a pedal.
    pub fn position(&self, id: UnitId) -> Option<usize> {
        self.pedals.iter().position(|p| p.id() == id)
    }

    /// Number of pedals.
    pub fn len(&self) -> usize {
        self.pedals.len()
    }

    /// Returns true if there are no pedals.
    pub fn is_empty(&self) -> bool {
        self.pedals.is_empty()
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Fires due momentary releases on every pedal.
    pub fn tick(&mut self, host: &mut dyn AudioHost) -> bool {
        let mut released = false;
        for pedal in &mut self.pedals {
            released |= pedal.poll(host);
        }
        released
    }

    /// Registers a listener for board events.
    pub fn subscribe(&mut self, listener: impl FnMut(&BoardEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Disposes every pedal and releases the board's own nodes. Safe to call twice.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.dispose_pedals(host);
        host.release(self.input);
        host.release(self.output);
        self.downstream = None;
        self.media_sink = None;
        self.listeners.clear();
        self.disposed = true;
    }

    // --- presets ---

    /// Snapshot of the board as a preset document.
    pub fn serialize(&self) -> BoardPreset {
        BoardPreset {
            name: None,
            description: None,
            pedals: self
                .pedals
                .iter()
                .map(|pedal| PedalPreset {
                    name: pedal.name().to_string(),
                    bypassed: pedal.is_bypassed(),
                    pots: pedal
                        .pots()
                        .map(|pot| PotPreset {
                            name: pot.name().to_string(),
                            value: pot.value(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Replaces the board contents with a preset.
    ///
    /// The document is validated first; an invalid document returns an error
    /// and leaves the board untouched. Unknown pedal names are skipped with a
    /// warning. Pot values are applied before the bypass state, and the board
    /// is recomputed once at the end.
    pub fn deserialize(
        &mut self,
        host: &mut dyn AudioHost,
        preset: &BoardPreset,
        source: &dyn PedalSource,
    ) -> Result<LoadReport> {
        preset.validate()?;
        if self.disposed {
            return Ok(LoadReport::default());
        }

        self.dispose_pedals(host);

        let mut report = LoadReport::default();
        for entry in &preset.pedals {
            let Some(mut pedal) = source.build(host, &entry.name) else {
                tracing::warn!(pedal = %entry.name, "unknown pedal in preset, skipping");
                report.skipped.push(entry.name.clone());
                continue;
            };
            for pot in &entry.pots {
                if pedal.set_pot(host, &pot.name, pot.value).is_none() {
                    tracing::warn!(pedal = %entry.name, pot = %pot.name, "unknown pot in preset");
                }
            }
            if pedal.is_bypassed() != entry.bypassed {
                pedal.set_bypass(host, entry.bypassed);
            }
            self.pedals.push(pedal);
            report.loaded += 1;
        }

        self.recompute(host);
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "preset loaded"
        );
        self.emit(&BoardEvent::PresetLoaded {
            loaded: report.loaded,
            skipped: report.skipped.clone(),
        });
        Ok(report)
    }

    /// Parses, validates and loads a JSON preset.
    ///
    /// Parse and validation errors return before the board is touched.
    pub fn load_json(
        &mut self,
        host: &mut dyn AudioHost,
        json: &str,
        source: &dyn PedalSource,
    ) -> Result<LoadReport> {
        let preset = BoardPreset::from_json(json)?;
        self.deserialize(host, &preset, source)
    }

    // --- internals ---

    fn recompute(&mut self, host: &mut dyn AudioHost) {
        for pedal in &mut self.pedals {
            pedal.disconnect(host);
        }
        host.disconnect_quietly(self.input);
        host.disconnect_quietly(self.output);

        if self.pedals.is_empty() {
            host.connect_logged(self.input, self.output);
        } else {
            let inputs: Vec<NodeId> = self.pedals.iter().map(EffectUnit::input).collect();
            host.connect_logged(self.input, inputs[0]);
            let targets = inputs[1..].iter().copied().chain(std::iter::once(self.output));
            for (pedal, next) in self.pedals.iter_mut().zip(targets) {
                pedal.connect(host, next);
            }
        }

        if let Some(next) = self.downstream {
            host.connect_logged(self.output, next);
        }
        if let Some(sink) = self.media_sink {
            host.connect_logged(self.output, sink);
        }

        tracing::debug!(pedals = self.pedals.len(), "board recomputed");
        self.emit(&BoardEvent::TopologyChanged);
    }

    fn dispose_pedals(&mut self, host: &mut dyn AudioHost) {
        for mut pedal in self.pedals.drain(..) {
            pedal.dispose(host);
        }
    }

    fn emit(&mut self, event: &BoardEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("downstream", &self.downstream)
            .field("pedals", &self.pedals)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
