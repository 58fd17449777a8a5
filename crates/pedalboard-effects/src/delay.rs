//! Feedback delay with parallel dry and wet paths.
//!
//! ```text
//! input ──► dry ─────────────┐
//!   │                        ▼
//!   └──► delay ──► wet ───► level ──► output
//!         ▲  │
//!         └──feedback
//! ```
//!
//! Feedback is capped at [`FEEDBACK_CAP`] so the loop always decays. The mix
//! control fades the wet path in directly and the dry path out at half rate
//! (`dry = 1 − mix·0.5`), so some dry signal always remains.

use std::time::Duration;

use pedalboard_core::{AudioHost, HostExt, NodeId, ParamKind, Pot, PrimitiveKind};

use crate::kernel::Control;

/// Longest supported delay time in seconds.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

/// Upper bound on feedback gain.
pub const FEEDBACK_CAP: f32 = 0.95;

/// Delay kernel state.
#[derive(Debug, Clone)]
pub struct Delay {
    delay: NodeId,
    feedback: NodeId,
    wet: NodeId,
    dry: NodeId,
    time: f32,
    feedback_amount: f32,
    mix: f32,
}

impl Delay {
    /// Creates the delay line and its gain stages on the host.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let delay = host.create(PrimitiveKind::Delay {
            max_time: Duration::from_secs_f32(MAX_DELAY_SECONDS),
        });
        let feedback = host.create_gain(0.0);
        let wet = host.create_gain(0.0);
        let dry = host.create_gain(1.0);
        Self {
            delay,
            feedback,
            wet,
            dry,
            time: 0.0,
            feedback_amount: 0.0,
            mix: 0.0,
        }
    }

    pub(crate) fn pots() -> Vec<(Pot, Control)> {
        vec![
            (Pot::linear("time", 0.0, MAX_DELAY_SECONDS, 0.3), Control::Time),
            (Pot::linear("feedback", 0.0, FEEDBACK_CAP, 0.4), Control::Feedback),
            (Pot::linear("mix", 0.0, 1.0, 0.5), Control::Mix),
        ]
    }

    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        vec![self.dry, self.delay, self.feedback, self.wet]
    }

    pub(crate) fn entry_nodes(&self) -> Vec<NodeId> {
        vec![self.dry, self.delay]
    }

    pub(crate) fn internal_edges(&self, input: NodeId, level: NodeId) -> Vec<(NodeId, NodeId)> {
        vec![
            (input, self.dry),
            (self.dry, level),
            (input, self.delay),
            (self.delay, self.wet),
            (self.delay, self.feedback),
            (self.feedback, self.delay),
            (self.wet, level),
        ]
    }

    /// Sets the delay time in seconds, clamped to `0..=2`.
    pub fn set_delay_time(&mut self, host: &mut dyn AudioHost, seconds: f32) {
        self.time = seconds.clamp(0.0, MAX_DELAY_SECONDS);
        host.apply_param(self.delay, ParamKind::DelayTime, self.time);
    }

    /// Sets the feedback gain, clamped to `0..=0.95`. Returns the applied value.
    pub fn set_feedback(&mut self, host: &mut dyn AudioHost, amount: f32) -> f32 {
        self.feedback_amount = amount.clamp(0.0, FEEDBACK_CAP);
        host.apply_param(self.feedback, ParamKind::Gain, self.feedback_amount);
        self.feedback_amount
    }

    /// Sets the wet/dry balance, clamped to `0..=1`.
    pub fn set_mix(&mut self, host: &mut dyn AudioHost, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
        host.apply_param(self.wet, ParamKind::Gain, self.mix);
        host.apply_param(self.dry, ParamKind::Gain, 1.0 - self.mix * 0.5);
    }

    /// Current delay time in seconds.
    pub fn delay_time(&self) -> f32 {
        self.time
    }

    /// Current feedback gain.
    pub fn feedback(&self) -> f32 {
        self.feedback_amount
    }

    /// Current mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// The delay-line node.
    pub fn delay_node(&self) -> NodeId {
        self.delay
    }

    /// The feedback gain node.
    pub fn feedback_node(&self) -> NodeId {
        self.feedback
    }

    /// The wet gain node.
    pub fn wet_node(&self) -> NodeId {
        self.wet
    }

    /// The dry gain node.
    pub fn dry_node(&self) -> NodeId {
        self.dry
    }

    pub(crate) fn apply(&mut self, host: &mut dyn AudioHost, control: Control, value: f32) {
        match control {
            Control::Time => self.set_delay_time(host, value),
            Control::Feedback => {
                self.set_feedback(host, value);
            }
            Control::Mix => self.set_mix(host, value),
            other => tracing::debug!(?other, "delay ignores control"),
        }
    }
}
