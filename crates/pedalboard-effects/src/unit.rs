//! Effect unit: one pedal on the board.
//!
//! An [`EffectUnit`] wraps a [`ChainModel`] around its kernel primitives plus a
//! shared level stage, and owns the controls a player touches: the level pot,
//! the kernel pots, the bypass footswitch and its LED.
//!
//! # Bypass
//!
//! Engaged and bypassed are different topologies, not a muted kernel:
//!
//! ```text
//! engaged:   input → kernel … → level → output → downstream
//! bypassed:  input → output → downstream        (kernel and level detached)
//! ```
//!
//! The bypass switch carries a routing table derived from the kernel's entry
//! nodes and the level stage, so it can rewire the unit boundary without
//! knowing the pedal type. The unit then settles the kernel interior: a full
//! rebuild when engaging, a detach when bypassing. Listeners are notified
//! only after both steps, so nobody observes a half-rewired unit.

use std::fmt;

use pedalboard_core::{
    AudioHost, BypassRoute, ChainModel, HostExt, Led, NodeId, ParamKind, Pot, PotChange, Switch,
};
use serde::Serialize;

use crate::kernel::{Control, Kernel, PedalKind};

/// Name of the shared level pot.
pub const LEVEL_POT: &str = "level";

/// Name of the bypass footswitch.
pub const BYPASS_SWITCH: &str = "bypass";

/// Stable identity of a unit, valid for the lifetime of its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Returns the raw numeric identifier.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl From<NodeId> for UnitId {
    fn from(node: NodeId) -> Self {
        Self(node.index())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Notification emitted by a unit after a change has fully applied.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitEvent {
    /// A pot moved.
    ParameterChanged {
        /// Pot name.
        pot: String,
        /// Old and new values.
        change: PotChange,
    },
    /// The unit was engaged or bypassed.
    BypassChanged {
        /// New bypass state.
        bypassed: bool,
    },
}

type UnitListener = Box<dyn FnMut(&UnitEvent)>;

#[derive(Debug)]
struct ControlSlot {
    pot: Pot,
    control: Control,
}

/// A pedal: chain model, kernel, controls and bypass routing.
pub struct EffectUnit {
    id: UnitId,
    kernel: Kernel,
    model: ChainModel,
    level: NodeId,
    controls: Vec<ControlSlot>,
    bypass: Switch,
    led: Led,
    switches: Vec<Switch>,
    listeners: Vec<UnitListener>,
    disposed: bool,
}

impl EffectUnit {
    /// Builds a unit around `kernel` in the kernel's default bypass state.
    pub fn new(host: &mut dyn AudioHost, kernel: Kernel) -> Self {
        let bypassed = kernel.default_bypassed();
        Self::with_bypassed(host, kernel, bypassed)
    }

    /// Builds a built-in pedal by kind. `None` for [`PedalKind::Custom`].
    pub fn of_kind(host: &mut dyn AudioHost, kind: PedalKind) -> Option<Self> {
        Kernel::build(host, kind).map(|kernel| Self::new(host, kernel))
    }

    /// Builds a unit around `kernel` with an explicit initial bypass state.
    pub fn with_bypassed(host: &mut dyn AudioHost, mut kernel: Kernel, bypassed: bool) -> Self {
        let level = host.create_gain(1.0);
        let mut effects = kernel.nodes();
        effects.push(level);
        let mut model = ChainModel::new(host).with_effects(effects);
        if let Some(edges) = kernel.internal_edges(model.input(), level) {
            model.set_internal_edges(edges);
        }

        let mut controls = vec![ControlSlot {
            pot: Pot::linear(LEVEL_POT, 0.0, 10.0, 10.0),
            control: Control::Level,
        }];
        controls.extend(
            kernel
                .take_pots()
                .into_iter()
                .map(|(pot, control)| ControlSlot { pot, control }),
        );
        let switches = kernel.take_switches();

        let mut bypass = Switch::toggle_switch(BYPASS_SWITCH, !bypassed);
        let led = Led::follow(&mut bypass);

        let mut unit = Self {
            id: UnitId::from(model.input()),
            kernel,
            model,
            level,
            controls,
            bypass,
            led,
            switches,
            listeners: Vec::new(),
            disposed: false,
        };

        for index in 0..unit.controls.len() {
            unit.apply_control(host, index);
        }
        unit.model.route_internal(host);
        let routes = unit.bypass_table();
        unit.bypass.set_routes(host, routes);
        unit.settle(host);

        tracing::debug!(pedal = unit.name(), id = %unit.id, bypassed, "effect unit built");
        unit
    }

    /// Stable identity.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Pedal name, used as the preset key.
    pub fn name(&self) -> &str {
        self.kernel.name()
    }

    /// Pedal type.
    pub fn kind(&self) -> PedalKind {
        self.kernel.kind()
    }

    /// The unit's input node.
    pub fn input(&self) -> NodeId {
        self.model.input()
    }

    /// The unit's output node.
    pub fn output(&self) -> NodeId {
        self.model.output()
    }

    /// The shared level gain node.
    pub fn level_node(&self) -> NodeId {
        self.level
    }

    /// The underlying chain model.
    pub fn model(&self) -> &ChainModel {
        &self.model
    }

    /// Typed access to the kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Mutable kernel access.
    ///
    /// Changes made here bypass the pots, so pot values will not reflect them.
    pub fn kernel_mut(&mut self) -> &mut Kernel {
        &mut self.kernel
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // --- routing ---

    /// Routes the unit into `destination`, preserving the bypass state.
    pub fn connect(&mut self, host: &mut dyn AudioHost, destination: NodeId) {
        if self.disposed {
            return;
        }
        self.model.connect(host, destination);
        self.settle(host);
    }

    /// Unhooks the output from its downstream target.
    pub fn disconnect(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.model.disconnect(host);
    }

    /// Tears the unit down and releases its primitives. Safe to call twice.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        let nodes: Vec<NodeId> = self.model.nodes().collect();
        self.bypass.dispose();
        for switch in &mut self.switches {
            switch.dispose();
        }
        for slot in &mut self.controls {
            slot.pot.clear_listeners();
        }
        self.model.dispose(host);
        for node in nodes {
            host.release(node);
        }
        self.listeners.clear();
        self.disposed = true;
        tracing::debug!(pedal = self.name(), id = %self.id, "effect unit disposed");
    }

    // --- bypass ---

    /// Returns true while the kernel is routed around.
    pub fn is_bypassed(&self) -> bool {
        !self.bypass.state()
    }

    /// Flips the bypass state.
    pub fn toggle_bypass(&mut self, host: &mut dyn AudioHost) {
        let bypassed = self.is_bypassed();
        self.set_bypass(host, !bypassed);
    }

    /// Engages or bypasses the unit. No-op if already in that state.
    pub fn set_bypass(&mut self, host: &mut dyn AudioHost, bypassed: bool) {
        if self.disposed || !self.bypass.set_state(host, !bypassed) {
            return;
        }
        self.settle(host);
        self.emit(&UnitEvent::BypassChanged { bypassed });
    }

    /// The bypass footswitch.
    pub fn bypass_switch(&self) -> &Switch {
        &self.bypass
    }

    /// The bypass LED.
    pub fn led(&self) -> &Led {
        &self.led
    }

    // --- pots ---

    /// All pots, level first.
    pub fn pots(&self) -> impl Iterator<Item = &Pot> {
        self.controls.iter().map(|slot| &slot.pot)
    }

    /// Looks up a pot by name.
    pub fn pot(&self, name: &str) -> Option<&Pot> {
        self.pots().find(|pot| pot.name() == name)
    }

    /// Sets a pot by actual value. `None` if disposed or no such pot.
    pub fn set_pot(
        &mut self,
        host: &mut dyn AudioHost,
        name: &str,
        value: f32,
    ) -> Option<PotChange> {
        self.update_pot(host, name, |pot| pot.set_actual_value(value))
    }

    /// Sets a pot by normalized position.
    pub fn set_pot_normalized(
        &mut self,
        host: &mut dyn AudioHost,
        name: &str,
        t: f32,
    ) -> Option<PotChange> {
        self.update_pot(host, name, |pot| pot.set_value(t))
    }

    /// Sets a pot from a 0–10 dial reading mapped linearly onto its range.
    ///
    /// `set_pot_display(host, "time", 5.0)` on a delay sets 1 second.
    pub fn set_pot_display(
        &mut self,
        host: &mut dyn AudioHost,
        name: &str,
        display: f32,
    ) -> Option<PotChange> {
        self.update_pot(host, name, |pot| {
            let t = display.clamp(0.0, 10.0) / 10.0;
            pot.set_actual_value(pot.min() + t * (pot.max() - pot.min()))
        })
    }

    /// Sets the level on the 0–10 scale.
    pub fn set_level(&mut self, host: &mut dyn AudioHost, level: f32) -> Option<PotChange> {
        self.set_pot(host, LEVEL_POT, level)
    }

    /// Current level on the 0–10 scale.
    pub fn level(&self) -> f32 {
        self.pot(LEVEL_POT).map_or(0.0, Pot::value)
    }

    // --- extra switches ---

    /// Adds an extra footswitch (tap tempo, momentary boost, ...).
    pub fn add_switch(&mut self, switch: Switch) {
        self.switches.push(switch);
    }

    /// Extra footswitches, excluding bypass.
    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    /// Looks up an extra footswitch.
    pub fn switch_mut(&mut self, name: &str) -> Option<&mut Switch> {
        self.switches.iter_mut().find(|s| s.name() == name)
    }

    /// Toggles (or presses) an extra footswitch. Returns false if unknown.
    pub fn press_switch(&mut self, host: &mut dyn AudioHost, name: &str) -> bool {
        if self.disposed {
            return false;
        }
        match self.switch_mut(name) {
            Some(switch) => {
                switch.toggle(host);
                true
            }
            None => false,
        }
    }

    /// Fires due momentary releases. Returns true if any switch released.
    pub fn poll(&mut self, host: &mut dyn AudioHost) -> bool {
        if self.disposed {
            return false;
        }
        let mut released = false;
        for switch in &mut self.switches {
            released |= switch.poll(host);
        }
        released
    }

    // --- observers ---

    /// Registers a listener for parameter and bypass changes.
    pub fn subscribe(&mut self, listener: impl FnMut(&UnitEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // --- internals ---

    fn update_pot(
        &mut self,
        host: &mut dyn AudioHost,
        name: &str,
        update: impl FnOnce(&mut Pot) -> PotChange,
    ) -> Option<PotChange> {
        if self.disposed {
            return None;
        }
        let Some(index) = self.controls.iter().position(|s| s.pot.name() == name) else {
            tracing::debug!(pedal = self.name(), pot = name, "no such pot");
            return None;
        };
        let change = update(&mut self.controls[index].pot);
        self.apply_control(host, index);
        self.emit(&UnitEvent::ParameterChanged {
            pot: name.to_string(),
            change,
        });
        Some(change)
    }

    fn apply_control(&mut self, host: &mut dyn AudioHost, index: usize) {
        let slot = &self.controls[index];
        let value = slot.pot.value();
        match slot.control {
            Control::Level => {
                host.apply_param(self.level, ParamKind::Gain, value.clamp(0.0, 10.0) / 10.0);
            }
            control => self.kernel.apply(host, control, value),
        }
    }

    /// `(active, input, bypass)` rows for the bypass switch.
    fn bypass_table(&self) -> Vec<BypassRoute> {
        let mut entry = self.kernel.entry_nodes();
        if entry.is_empty() {
            entry.push(self.level);
        }
        vec![
            BypassRoute::fan_out(entry, self.model.input(), Some(self.model.output())),
            BypassRoute::new(self.model.output(), self.level, None),
        ]
    }

    /// Brings the kernel interior in line with the switch state.
    fn settle(&mut self, host: &mut dyn AudioHost) {
        if self.bypass.state() {
            self.model.route_internal(host);
        } else {
            self.short_circuit(host);
        }
    }

    fn short_circuit(&mut self, host: &mut dyn AudioHost) {
        for node in self.model.nodes().collect::<Vec<_>>() {
            host.disconnect_quietly(node);
        }
        host.connect_logged(self.model.input(), self.model.output());
        if let Some(next) = self.model.downstream() {
            host.connect_logged(self.model.output(), next);
        }
    }

    fn emit(&mut self, event: &UnitEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for EffectUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectUnit")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("bypassed", &self.is_bypassed())
            .field("controls", &self.controls)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
