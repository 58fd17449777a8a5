//! Pedalboard Effects - pedals built on pedalboard-core
//!
//! Every pedal is an [`EffectUnit`]: a chain model, a shared level stage, a
//! bypass footswitch with LED, and one [`Kernel`] holding the pedal-specific
//! primitives:
//!
//! - [`Overdrive`] - Oversampled wave shaper with a lowpass tone control
//! - [`Delay`] - Feedback delay with parallel dry and wet paths
//! - [`Reverb`] - Convolution reverb over a synthesized impulse response
//! - [`Cabinet`] - Five-stage speaker cabinet EQ with named voicings
//! - [`CustomKernel`] - Caller-assembled series chain
//!
//! A volume pedal is a unit whose kernel is empty.
//!
//! ## Example
//!
//! ```rust
//! use pedalboard_core::{AudioHost, SignalGraph};
//! use pedalboard_effects::{EffectUnit, PedalKind};
//!
//! let mut graph = SignalGraph::new(48000.0);
//! let mut overdrive = EffectUnit::of_kind(&mut graph, PedalKind::Overdrive).unwrap();
//! let out = graph.destination();
//! overdrive.connect(&mut graph, out);
//!
//! overdrive.set_pot(&mut graph, "drive", 7.0);
//! overdrive.toggle_bypass(&mut graph);
//! assert!(!overdrive.is_bypassed());
//! ```

pub mod cabinet;
pub mod custom;
pub mod delay;
pub mod kernel;
pub mod overdrive;
pub mod reverb;
pub mod unit;

pub use cabinet::{Cabinet, CabinetType};
pub use custom::{CustomKernel, CustomKernelBuilder};
pub use delay::{Delay, FEEDBACK_CAP, MAX_DELAY_SECONDS};
pub use kernel::{Control, Kernel, PedalKind};
pub use overdrive::{CURVE_SAMPLES, Overdrive, make_distortion_curve};
pub use reverb::{Reverb, generate_impulse};
pub use unit::{BYPASS_SWITCH, EffectUnit, LEVEL_POT, UnitEvent, UnitId};
