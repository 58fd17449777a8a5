//! Footswitches and the bypass routing table they drive.
//!
//! A [`Switch`] is a two-state machine. Changing state rewires its attached
//! [`BypassRoute`] table and then notifies subscribers. Setting the state it
//! already has does nothing at all: no rewiring, no events.
//!
//! Momentary switches release themselves after a short delay. There are no
//! timers here; the switch records a deadline against the host clock and
//! [`Switch::poll`] performs the release once the deadline has passed.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::host::{AudioHost, HostExt, NodeId};

/// Default auto-release delay of a momentary switch.
pub const DEFAULT_RELEASE_AFTER: Duration = Duration::from_millis(100);

/// One row of a bypass routing table.
///
/// When the switch is on, `input` feeds every node in `active`. When it is
/// off, `input` feeds `bypass` (or nothing). `input` is disconnected first
/// either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRoute {
    /// Nodes fed while engaged. More than one for parallel kernels.
    pub active: Vec<NodeId>,
    /// The node being rerouted.
    pub input: NodeId,
    /// Node fed while bypassed.
    pub bypass: Option<NodeId>,
}

impl BypassRoute {
    /// Creates a single-target route.
    pub fn new(active: NodeId, input: NodeId, bypass: Option<NodeId>) -> Self {
        Self {
            active: vec![active],
            input,
            bypass,
        }
    }

    /// Creates a route whose engaged side fans out.
    pub fn fan_out(active: Vec<NodeId>, input: NodeId, bypass: Option<NodeId>) -> Self {
        Self {
            active,
            input,
            bypass,
        }
    }
}

/// Behaviour of a switch when toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// Latching: each toggle flips the state.
    Toggle,
    /// Spring-loaded: toggling presses, and the switch releases itself.
    Momentary {
        /// Delay before the automatic release.
        release_after: Duration,
    },
}

/// Notification emitted after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEvent {
    /// The state changed to the contained value.
    Changed(bool),
    /// The switch turned on.
    On,
    /// The switch turned off.
    Off,
}

/// Serializable description of a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchConfig {
    /// Switch name.
    pub name: String,
    /// Current state.
    pub on: bool,
    /// Whether the switch is momentary.
    pub momentary: bool,
}

type SwitchListener = Box<dyn FnMut(&SwitchEvent)>;

/// A named two-state footswitch.
pub struct Switch {
    name: String,
    state: bool,
    kind: SwitchKind,
    routes: Vec<BypassRoute>,
    release_at: Option<Duration>,
    listeners: Vec<SwitchListener>,
}

impl Switch {
    /// Creates a latching switch.
    pub fn toggle_switch(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            state: default,
            kind: SwitchKind::Toggle,
            routes: Vec::new(),
            release_at: None,
            listeners: Vec::new(),
        }
    }

    /// Creates a momentary switch, initially released.
    pub fn momentary(name: impl Into<String>) -> Self {
        Self {
            kind: SwitchKind::Momentary {
                release_after: DEFAULT_RELEASE_AFTER,
            },
            ..Self::toggle_switch(name, false)
        }
    }

    /// Overrides the auto-release delay. No effect on latching switches.
    #[must_use]
    pub fn with_release_after(mut self, delay: Duration) -> Self {
        if let SwitchKind::Momentary { release_after } = &mut self.kind {
            *release_after = delay;
        }
        self
    }

    /// Switch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    pub fn state(&self) -> bool {
        self.state
    }

    /// Switch behaviour.
    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    /// Returns true for momentary switches.
    pub fn is_momentary(&self) -> bool {
        matches!(self.kind, SwitchKind::Momentary { .. })
    }

    /// Host time at which a pending auto-release fires.
    pub fn pending_release(&self) -> Option<Duration> {
        self.release_at
    }

    /// The attached routing table.
    pub fn routes(&self) -> &[BypassRoute] {
        &self.routes
    }

    /// Attaches a routing table and applies it for the current state.
    pub fn set_routes(&mut self, host: &mut dyn AudioHost, routes: Vec<BypassRoute>) {
        self.routes = routes;
        self.route(host);
    }

    /// Sets the state. Returns whether anything changed.
    pub fn set_state(&mut self, host: &mut dyn AudioHost, state: bool) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        self.route(host);
        self.emit(SwitchEvent::Changed(state));
        self.emit(if state {
            SwitchEvent::On
        } else {
            SwitchEvent::Off
        });
        true
    }

    /// Flips a latching switch, or presses a momentary one.
    ///
    /// A momentary press (re)arms the auto-release deadline, replacing any
    /// release still pending from an earlier press.
    pub fn toggle(&mut self, host: &mut dyn AudioHost) {
        match self.kind {
            SwitchKind::Toggle => {
                let next = !self.state;
                self.set_state(host, next);
            }
            SwitchKind::Momentary { release_after } => {
                self.release_at = None;
                self.set_state(host, true);
                self.release_at = Some(host.now() + release_after);
            }
        }
    }

    /// Presses a momentary switch without arming the auto-release.
    pub fn press(&mut self, host: &mut dyn AudioHost) {
        self.release_at = None;
        self.set_state(host, true);
    }

    /// Releases the switch now, cancelling any pending auto-release.
    pub fn release(&mut self, host: &mut dyn AudioHost) {
        self.release_at = None;
        self.set_state(host, false);
    }

    /// Fires a due auto-release. Returns true if the switch was released.
    pub fn poll(&mut self, host: &mut dyn AudioHost) -> bool {
        match self.release_at {
            Some(deadline) if host.now() >= deadline => {
                self.release(host);
                true
            }
            _ => false,
        }
    }

    /// Drops any pending auto-release without changing state.
    pub fn cancel_pending(&mut self) {
        self.release_at = None;
    }

    /// Cancels pending work and forgets listeners and routes.
    pub fn dispose(&mut self) {
        self.release_at = None;
        self.listeners.clear();
        self.routes.clear();
    }

    /// Registers a state-change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&SwitchEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Serializable snapshot.
    pub fn config(&self) -> SwitchConfig {
        SwitchConfig {
            name: self.name.clone(),
            on: self.state,
            momentary: self.is_momentary(),
        }
    }

    fn route(&self, host: &mut dyn AudioHost) {
        for route in &self.routes {
            host.disconnect_quietly(route.input);
            if self.state {
                for &active in &route.active {
                    host.connect_logged(route.input, active);
                }
            } else if let Some(bypass) = route.bypass {
                host.connect_logged(route.input, bypass);
            }
        }
    }

    fn emit(&mut self, event: SwitchEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switch")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("routes", &self.routes)
            .field("release_at", &self.release_at)
            .finish_non_exhaustive()
    }
}
