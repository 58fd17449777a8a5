//! Master output chain.
//!
//! ```text
//! input → compressor → limiter → master gain → analyser → destination
//! ```
//!
//! The compressor evens out the board's level; the limiter behind it keeps
//! peaks under full scale regardless of what the pedals do.

use pedalboard_core::{AudioHost, HostExt, NodeId, ParamKind, PrimitiveKind};

/// Dynamics settings for a compressor primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dynamics {
    /// Threshold in dB.
    pub threshold: f32,
    /// Knee width in dB.
    pub knee: f32,
    /// Compression ratio.
    pub ratio: f32,
    /// Attack in seconds.
    pub attack: f32,
    /// Release in seconds.
    pub release: f32,
}

impl Dynamics {
    /// Gentle bus compression.
    pub const COMPRESSOR: Self = Self {
        threshold: -24.0,
        knee: 30.0,
        ratio: 12.0,
        attack: 0.003,
        release: 0.25,
    };

    /// Brick-wall limiting just under full scale.
    pub const LIMITER: Self = Self {
        threshold: -0.5,
        knee: 0.0,
        ratio: 20.0,
        attack: 0.001,
        release: 0.01,
    };

    fn apply(&self, host: &mut dyn AudioHost, node: NodeId) {
        host.apply_param(node, ParamKind::Threshold, self.threshold);
        host.apply_param(node, ParamKind::Knee, self.knee);
        host.apply_param(node, ParamKind::Ratio, self.ratio);
        host.apply_param(node, ParamKind::Attack, self.attack);
        host.apply_param(node, ParamKind::Release, self.release);
    }
}

/// The stage's master output.
#[derive(Debug)]
pub struct Output {
    input: NodeId,
    compressor: NodeId,
    limiter: NodeId,
    master: NodeId,
    analyser: NodeId,
    volume: f32,
    muted_volume: Option<f32>,
    compressor_enabled: bool,
    disposed: bool,
}

impl Output {
    /// Builds the master chain and connects it to the host destination.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let input = host.create_gain(1.0);
        let compressor = host.create(PrimitiveKind::Compressor);
        Dynamics::COMPRESSOR.apply(host, compressor);
        let limiter = host.create(PrimitiveKind::Compressor);
        Dynamics::LIMITER.apply(host, limiter);
        let master = host.create_gain(1.0);
        let analyser = host.create(PrimitiveKind::Analyser);

        let destination = host.destination();
        host.connect_logged(input, compressor);
        host.connect_logged(compressor, limiter);
        host.connect_logged(limiter, master);
        host.connect_logged(master, analyser);
        host.connect_logged(analyser, destination);

        Self {
            input,
            compressor,
            limiter,
            master,
            analyser,
            volume: 1.0,
            muted_volume: None,
            compressor_enabled: true,
            disposed: false,
        }
    }

    /// Node the board feeds into.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The compressor node.
    pub fn compressor(&self) -> NodeId {
        self.compressor
    }

    /// The limiter node.
    pub fn limiter(&self) -> NodeId {
        self.limiter
    }

    /// The master gain node.
    pub fn master(&self) -> NodeId {
        self.master
    }

    /// The analyser tap in front of the destination.
    pub fn analyser(&self) -> NodeId {
        self.analyser
    }

    /// Sets the master volume, clamped to 0–1.
    ///
    /// Setting a volume while muted unmutes.
    pub fn set_volume(&mut self, host: &mut dyn AudioHost, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;
        self.muted_volume = None;
        host.apply_param(self.master, ParamKind::Gain, volume);
    }

    /// Current master volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Silences the output, remembering the volume.
    pub fn mute(&mut self, host: &mut dyn AudioHost) {
        if self.muted_volume.is_some() {
            return;
        }
        self.muted_volume = Some(self.volume);
        self.volume = 0.0;
        host.apply_param(self.master, ParamKind::Gain, 0.0);
    }

    /// Restores the volume from before [`mute`](Self::mute).
    pub fn unmute(&mut self, host: &mut dyn AudioHost) {
        if let Some(previous) = self.muted_volume.take() {
            self.volume = previous;
            host.apply_param(self.master, ParamKind::Gain, previous);
        }
    }

    /// Returns true while muted.
    pub fn is_muted(&self) -> bool {
        self.muted_volume.is_some()
    }

    /// Routes the input through the compressor, or straight to the limiter.
    pub fn set_compressor_enabled(&mut self, host: &mut dyn AudioHost, enabled: bool) {
        self.compressor_enabled = enabled;
        host.disconnect_quietly(self.input);
        let next = if enabled { self.compressor } else { self.limiter };
        host.connect_logged(self.input, next);
    }

    /// Returns true if the compressor is in the path.
    pub fn compressor_enabled(&self) -> bool {
        self.compressor_enabled
    }

    /// Overrides the compressor settings.
    pub fn set_compressor(&mut self, host: &mut dyn AudioHost, dynamics: Dynamics) {
        dynamics.apply(host, self.compressor);
    }

    /// Taps the analyser into an additional destination.
    pub fn connect_destination(&mut self, host: &mut dyn AudioHost, node: NodeId) {
        host.connect_logged(self.analyser, node);
    }

    /// Releases every node. Safe to call twice.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        for node in [
            self.input,
            self.compressor,
            self.limiter,
            self.master,
            self.analyser,
        ] {
            host.release(node);
        }
        self.disposed = true;
    }
}
