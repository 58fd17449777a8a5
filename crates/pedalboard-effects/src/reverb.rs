//! Convolution reverb with a synthesized impulse response.
//!
//! Signal path: `input → dry → level` in parallel with
//! `input → convolver → wet → level`, then `level → output`.
//!
//! The impulse response is decaying stereo noise, one-pole smoothed by the
//! brightness setting. Room size and tone regenerate it wholesale; the three
//! shaping values (duration, decay, brightness) are kept as state so each
//! control only changes its own dimension.

use std::fmt;

use pedalboard_core::{AudioBuffer, AudioHost, HostExt, NodeId, ParamKind, Pot, PrimitiveKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kernel::Control;

/// Impulse length, decay and brightness used before any control moves.
const DEFAULT_SHAPE: (f32, f32, f32) = (2.0, 2.0, 0.5);

/// Synthesizes a stereo impulse response.
///
/// `length = sample_rate · duration`. Each sample is
/// `noise · (1 − i/length)^decay`, then blended with the previous output
/// sample: `s·b + prev·(1 − b)`. `brightness = 1` leaves the noise
/// untouched; values toward 0 smooth it into a dark tail.
pub fn generate_impulse<R: Rng>(
    sample_rate: f32,
    duration: f32,
    decay: f32,
    brightness: f32,
    rng: &mut R,
) -> AudioBuffer {
    let length = (sample_rate * duration.max(0.0)) as usize;
    let brightness = brightness.clamp(0.0, 1.0);
    let channels = (0..2)
        .map(|_| {
            let mut data = Vec::with_capacity(length);
            for i in 0..length {
                let envelope = (1.0 - i as f32 / length as f32).powf(decay);
                let mut sample = rng.random_range(-1.0f32..1.0) * envelope;
                if brightness < 1.0 && i > 0 {
                    sample = sample * brightness + data[i - 1] * (1.0 - brightness);
                }
                data.push(sample);
            }
            data
        })
        .collect();
    AudioBuffer::new(sample_rate, channels)
}

/// Reverb kernel state.
#[derive(Clone)]
pub struct Reverb {
    convolver: NodeId,
    wet: NodeId,
    dry: NodeId,
    duration: f32,
    decay: f32,
    brightness: f32,
    mix: f32,
    custom_impulse: bool,
    rng: StdRng,
}

impl Reverb {
    /// Creates the convolver and gain stages, seeding noise from the OS.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        Self::with_rng(host, StdRng::from_os_rng())
    }

    /// Creates a reverb whose impulse responses are reproducible.
    pub fn with_seed(host: &mut dyn AudioHost, seed: u64) -> Self {
        Self::with_rng(host, StdRng::seed_from_u64(seed))
    }

    fn with_rng(host: &mut dyn AudioHost, rng: StdRng) -> Self {
        let convolver = host.create(PrimitiveKind::Convolver);
        let wet = host.create_gain(0.3);
        let dry = host.create_gain(0.7);
        let (duration, decay, brightness) = DEFAULT_SHAPE;
        let mut reverb = Self {
            convolver,
            wet,
            dry,
            duration,
            decay,
            brightness,
            mix: 0.3,
            custom_impulse: false,
            rng,
        };
        reverb.regenerate(host);
        reverb
    }

    pub(crate) fn pots() -> Vec<(Pot, Control)> {
        vec![
            (Pot::linear("room", 0.0, 10.0, 5.0), Control::Room),
            (Pot::linear("mix", 0.0, 1.0, 0.3), Control::Mix),
            (Pot::linear("tone", 0.0, 10.0, 5.0), Control::Brightness),
        ]
    }

    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        vec![self.dry, self.convolver, self.wet]
    }

    pub(crate) fn entry_nodes(&self) -> Vec<NodeId> {
        vec![self.dry, self.convolver]
    }

    pub(crate) fn internal_edges(&self, input: NodeId, level: NodeId) -> Vec<(NodeId, NodeId)> {
        vec![
            (input, self.dry),
            (self.dry, level),
            (input, self.convolver),
            (self.convolver, self.wet),
            (self.wet, level),
        ]
    }

    /// Sets room size on the 0–10 scale: 0.5–4 s tail, decay exponent 2–4.
    pub fn set_room_size(&mut self, host: &mut dyn AudioHost, size: f32) {
        let size = size.clamp(0.0, 10.0) / 10.0;
        self.duration = 0.5 + size * 3.5;
        self.decay = 2.0 + size * 2.0;
        self.regenerate(host);
    }

    /// Sets brightness on the 0–10 scale.
    pub fn set_brightness(&mut self, host: &mut dyn AudioHost, tone: f32) {
        self.brightness = tone.clamp(0.0, 10.0) / 10.0;
        self.regenerate(host);
    }

    /// Sets the wet/dry balance: `wet = mix`, `dry = 1 − mix·0.7`.
    pub fn set_mix(&mut self, host: &mut dyn AudioHost, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
        host.apply_param(self.wet, ParamKind::Gain, self.mix);
        host.apply_param(self.dry, ParamKind::Gain, 1.0 - self.mix * 0.7);
    }

    /// Installs an externally loaded impulse response.
    ///
    /// On failure the error is logged and the synthesized default impulse
    /// is restored. Returns whether the loaded impulse was used.
    pub fn load_impulse<E: fmt::Display>(
        &mut self,
        host: &mut dyn AudioHost,
        loaded: Result<AudioBuffer, E>,
    ) -> bool {
        match loaded {
            Ok(impulse) => match host.set_impulse(self.convolver, impulse) {
                Ok(()) => {
                    self.custom_impulse = true;
                    true
                }
                Err(err) => {
                    tracing::warn!(error = %err, "impulse rejected by host");
                    false
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "impulse load failed, using generated impulse");
                (self.duration, self.decay, self.brightness) = DEFAULT_SHAPE;
                self.regenerate(host);
                false
            }
        }
    }

    /// Tail length in seconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Envelope decay exponent.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Smoothing factor in `[0, 1]`; 1 is brightest.
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Current mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Returns true while an externally loaded impulse is installed.
    pub fn has_custom_impulse(&self) -> bool {
        self.custom_impulse
    }

    /// The convolver node.
    pub fn convolver_node(&self) -> NodeId {
        self.convolver
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
            Control::Room => self.set_room_size(host, value),
            Control::Brightness => self.set_brightness(host, value),
            Control::Mix => self.set_mix(host, value),
            other => tracing::debug!(?other, "reverb ignores control"),
        }
    }

    fn regenerate(&mut self, host: &mut dyn AudioHost) {
        let impulse = generate_impulse(
            host.sample_rate(),
            self.duration,
            self.decay,
            self.brightness,
            &mut self.rng,
        );
        self.custom_impulse = false;
        if let Err(err) = host.set_impulse(self.convolver, impulse) {
            tracing::warn!(error = %err, "generated impulse rejected by host");
        }
    }
}

impl fmt::Debug for Reverb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reverb")
            .field("convolver", &self.convolver)
            .field("duration", &self.duration)
            .field("decay", &self.decay)
            .field("brightness", &self.brightness)
            .field("mix", &self.mix)
            .field("custom_impulse", &self.custom_impulse)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::SignalGraph;

    const RATE: f32 = 8000.0;

    #[test]
    fn test_impulse_length_and_channels() {
        let mut rng = StdRng::seed_from_u64(7);
        let impulse = generate_impulse(RATE, 0.5, 2.0, 1.0, &mut rng);
        assert_eq!(impulse.channel_count(), 2);
        assert_eq!(impulse.frames(), 4000);
    }

    #[test]
    fn test_impulse_decays() {
        let mut rng = StdRng::seed_from_u64(7);
        let impulse = generate_impulse(RATE, 1.0, 3.0, 1.0, &mut rng);
        let left = impulse.channel(0).unwrap();
        let energy = |slice: &[f32]| slice.iter().map(|s| s * s).sum::<f32>();
        assert!(energy(&left[..1000]) > energy(&left[7000..]) * 10.0);
        assert!(left.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_darker_impulse_is_smoother() {
        let roughness = |brightness: f32| {
            let mut rng = StdRng::seed_from_u64(11);
            let impulse = generate_impulse(RATE, 0.5, 2.0, brightness, &mut rng);
            let left = impulse.channel(0).unwrap();
            left.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f32>()
        };
        assert!(roughness(0.1) < roughness(1.0));
    }

    #[test]
    fn test_seeded_impulses_are_reproducible() {
        let a = generate_impulse(RATE, 0.2, 2.0, 0.5, &mut StdRng::seed_from_u64(3));
        let b = generate_impulse(RATE, 0.2, 2.0, 0.5, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_room_size_mapping() {
        let mut graph = SignalGraph::new(RATE);
        let mut reverb = Reverb::with_seed(&mut graph, 1);
        reverb.set_room_size(&mut graph, 10.0);
        assert_eq!(reverb.duration(), 4.0);
        assert_eq!(reverb.decay(), 4.0);
        let impulse = graph.impulse(reverb.convolver_node()).unwrap();
        assert_eq!(impulse.frames(), 32000);

        reverb.set_room_size(&mut graph, 0.0);
        assert_eq!(reverb.duration(), 0.5);
        assert_eq!(reverb.decay(), 2.0);
    }

    #[test]
    fn test_brightness_keeps_room_shape() {
        let mut graph = SignalGraph::new(RATE);
        let mut reverb = Reverb::with_seed(&mut graph, 1);
        reverb.set_room_size(&mut graph, 10.0);
        reverb.set_brightness(&mut graph, 2.0);
        assert_eq!(reverb.duration(), 4.0);
        assert_eq!(reverb.decay(), 4.0);
        assert!((reverb.brightness() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_mix_gains() {
        let mut graph = SignalGraph::new(RATE);
        let mut reverb = Reverb::with_seed(&mut graph, 1);
        reverb.set_mix(&mut graph, 1.0);
        assert_eq!(graph.param(reverb.wet_node(), ParamKind::Gain), Some(1.0));
        let dry = graph.param(reverb.dry_node(), ParamKind::Gain).unwrap();
        assert!((dry - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_failed_impulse_load_falls_back() {
        let mut graph = SignalGraph::new(RATE);
        let mut reverb = Reverb::with_seed(&mut graph, 1);
        let loaded = AudioBuffer::silent(RATE, 2, 100);
        assert!(reverb.load_impulse(&mut graph, Ok::<_, String>(loaded)));
        assert!(reverb.has_custom_impulse());
        assert_eq!(graph.impulse(reverb.convolver_node()).unwrap().frames(), 100);

        assert!(!reverb.load_impulse(&mut graph, Err::<AudioBuffer, _>("decode failed")));
        assert!(!reverb.has_custom_impulse());
        assert_eq!(
            graph.impulse(reverb.convolver_node()).unwrap().frames(),
            (RATE * 2.0) as usize
        );
    }
}
