//! Overdrive: wave-shaper distortion with a tone lowpass.
//!
//! Signal path: `input → shaper (4x oversampled) → tone lowpass → level → output`.

use std::f32::consts::PI;

use pedalboard_core::{
    AudioHost, FilterType, HostExt, NodeId, Oversample, ParamKind, Pot, PrimitiveKind,
};

use crate::kernel::Control;

/// Length of the synthesized transfer curve.
pub const CURVE_SAMPLES: usize = 22050;

/// Synthesizes the distortion transfer curve for drive amount `k`.
///
/// `curve[i] = ((3 + k)·x·20·(π/180)) / (π + k·|x|)` with `x` ramping
/// linearly across `[-1, 1)`.
///
/// # Example
///
/// ```rust
/// use pedalboard_effects::overdrive::make_distortion_curve;
///
/// let curve = make_distortion_curve(40.0, 1024);
/// assert_eq!(curve.len(), 1024);
/// assert!(curve[0] < 0.0 && curve[1023] > 0.0);
/// ```
pub fn make_distortion_curve(k: f32, samples: usize) -> Vec<f32> {
    let deg = PI / 180.0;
    let n = samples as f32;
    (0..samples)
        .map(|i| {
            let x = (i as f32 * 2.0) / n - 1.0;
            ((3.0 + k) * x * 20.0 * deg) / (PI + k * x.abs())
        })
        .collect()
}

/// Overdrive kernel state.
#[derive(Debug, Clone)]
pub struct Overdrive {
    shaper: NodeId,
    tone: NodeId,
    drive: f32,
    tone_value: f32,
}

impl Overdrive {
    /// Creates the shaper and tone filter on the host.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let shaper = host.create(PrimitiveKind::WaveShaper {
            oversample: Oversample::X4,
        });
        let tone = host.create_filter(FilterType::Lowpass, tone_frequency(7.0), 1.0);
        Self {
            shaper,
            tone,
            drive: 0.0,
            tone_value: 7.0,
        }
    }

    pub(crate) fn pots() -> Vec<(Pot, Control)> {
        vec![
            (Pot::logarithmic("drive", 0.0, 10.0, 4.0), Control::Drive),
            (Pot::logarithmic("tone", 0.0, 10.0, 7.0), Control::Tone),
        ]
    }

    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        vec![self.shaper, self.tone]
    }

    /// Sets drive on the 0–10 display scale and regenerates the curve.
    pub fn set_drive(&mut self, host: &mut dyn AudioHost, drive: f32) {
        self.drive = drive.clamp(0.0, 10.0);
        let curve = make_distortion_curve(self.drive * 10.0, CURVE_SAMPLES);
        if let Err(err) = host.set_curve(self.shaper, curve) {
            tracing::warn!(error = %err, "drive curve dropped");
        }
    }

    /// Sets tone on the 0–10 display scale (200 Hz … 5 kHz).
    pub fn set_tone(&mut self, host: &mut dyn AudioHost, tone: f32) {
        self.tone_value = tone.clamp(0.0, 10.0);
        host.apply_param(self.tone, ParamKind::Frequency, tone_frequency(self.tone_value));
    }

    /// Current drive (0–10).
    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// Current tone (0–10).
    pub fn tone(&self) -> f32 {
        self.tone_value
    }

    /// The wave-shaper node.
    pub fn shaper_node(&self) -> NodeId {
        self.shaper
    }

    /// The tone lowpass node.
    pub fn tone_node(&self) -> NodeId {
        self.tone
    }

    pub(crate) fn apply(&mut self, host: &mut dyn AudioHost, control: Control, value: f32) {
        match control {
            Control::Drive => self.set_drive(host, value),
            Control::Tone => self.set_tone(host, value),
            other => tracing::debug!(?other, "overdrive ignores control"),
        }
    }
}

fn tone_frequency(tone: f32) -> f32 {
    200.0 + tone * 480.0
}
