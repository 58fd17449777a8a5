//! Indicator LED.

use std::cell::Cell;
use std::rc::Rc;

use crate::switch::{Switch, SwitchEvent};

/// Pure follower of a [`Switch`].
///
/// The LED never touches routing; it only mirrors the last state its switch
/// announced.
#[derive(Debug, Clone)]
pub struct Led {
    state: Rc<Cell<bool>>,
}

impl Led {
    /// Creates an LED that tracks `switch`, starting from its current state.
    pub fn follow(switch: &mut Switch) -> Self {
        let state = Rc::new(Cell::new(switch.state()));
        let mirror = Rc::clone(&state);
        switch.subscribe(move |event| {
            if let SwitchEvent::Changed(on) = event {
                mirror.set(*on);
            }
        });
        Self { state }
    }

    /// Returns true while lit.
    pub fn is_on(&self) -> bool {
        self.state.get()
    }

    /// Returns true while dark.
    pub fn is_off(&self) -> bool {
        !self.is_on()
    }
}
