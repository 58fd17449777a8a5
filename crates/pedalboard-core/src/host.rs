//! Host audio engine contract.
//!
//! The pedal board never touches samples. Everything it does is expressed as
//! calls against an [`AudioHost`]: create a primitive, connect or disconnect it,
//! set one of its continuous parameters. A real engine (Web Audio, a native
//! graph, an embedded DSP runtime) implements this trait; [`SignalGraph`]
//! is the in-memory implementation used by tests and tooling.
//!
//! # Disconnect semantics
//!
//! [`AudioHost::disconnect`] removes *every* outgoing edge of a node, and
//! calling it on a node that has no edges is not an error. Chain rebuilds rely
//! on this: they always disconnect first and then reconnect in order.
//!
//! [`SignalGraph`]: crate::SignalGraph

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Opaque handle to a primitive owned by the host engine.
///
/// Node IDs are assigned by the host and never reused within one host instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Wraps a raw host identifier.
    ///
    /// Host implementations outside this crate use this to mint IDs.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Biquad response type of a filter primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Second-order lowpass.
    Lowpass,
    /// Second-order highpass.
    Highpass,
    /// Low shelf (boost/cut below the corner).
    Lowshelf,
    /// High shelf (boost/cut above the corner).
    Highshelf,
    /// Peaking bell around the center frequency.
    Peaking,
}

/// Oversampling applied by a wave-shaper primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Oversample {
    /// Shape at the native rate.
    #[default]
    None,
    /// 2x oversampling.
    X2,
    /// 4x oversampling.
    X4,
}

/// The kind of primitive to create on the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    /// Scalar gain stage.
    Gain,
    /// Biquad filter.
    Filter(FilterType),
    /// Delay line with a fixed maximum length.
    Delay {
        /// Longest delay the line can hold.
        max_time: Duration,
    },
    /// Convolution with an impulse response.
    Convolver,
    /// Static transfer-curve wave-shaper.
    WaveShaper {
        /// Oversampling around the shaper.
        oversample: Oversample,
    },
    /// Dynamics compressor (also used as a limiter).
    Compressor,
    /// Passive analyser tap.
    Analyser,
    /// Plays a decoded sample buffer.
    BufferSource,
    /// Live capture from an input device.
    Capture {
        /// Device identifier, `None` for the system default.
        device: Option<String>,
    },
    /// Exposes the signal as a recordable media stream.
    StreamSink,
    /// The host's hardware output.
    Destination,
}

impl PrimitiveKind {
    /// Returns true if this primitive exposes the given continuous parameter.
    pub fn accepts(&self, param: ParamKind) -> bool {
        match self {
            Self::Gain | Self::Capture { .. } => param == ParamKind::Gain,
            Self::Filter(_) => matches!(
                param,
                ParamKind::Frequency | ParamKind::Q | ParamKind::FilterGain
            ),
            Self::Delay { .. } => param == ParamKind::DelayTime,
            Self::Compressor => matches!(
                param,
                ParamKind::Threshold
                    | ParamKind::Knee
                    | ParamKind::Ratio
                    | ParamKind::Attack
                    | ParamKind::Release
            ),
            _ => false,
        }
    }

    /// Parameter values a freshly created primitive starts with.
    pub fn default_params(&self) -> &'static [(ParamKind, f32)] {
        match self {
            Self::Gain | Self::Capture { .. } => &[(ParamKind::Gain, 1.0)],
            Self::Filter(_) => &[
                (ParamKind::Frequency, 350.0),
                (ParamKind::Q, 1.0),
                (ParamKind::FilterGain, 0.0),
            ],
            Self::Delay { .. } => &[(ParamKind::DelayTime, 0.0)],
            Self::Compressor => &[
                (ParamKind::Threshold, -24.0),
                (ParamKind::Knee, 30.0),
                (ParamKind::Ratio, 12.0),
                (ParamKind::Attack, 0.003),
                (ParamKind::Release, 0.25),
            ],
            _ => &[],
        }
    }

    /// Short lowercase label, used in logs and topology dumps.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::Filter(FilterType::Lowpass) => "lowpass",
            Self::Filter(FilterType::Highpass) => "highpass",
            Self::Filter(FilterType::Lowshelf) => "lowshelf",
            Self::Filter(FilterType::Highshelf) => "highshelf",
            Self::Filter(FilterType::Peaking) => "peaking",
            Self::Delay { .. } => "delay",
            Self::Convolver => "convolver",
            Self::WaveShaper { .. } => "waveshaper",
            Self::Compressor => "compressor",
            Self::Analyser => "analyser",
            Self::BufferSource => "buffer-source",
            Self::Capture { .. } => "capture",
            Self::StreamSink => "stream-sink",
            Self::Destination => "destination",
        }
    }
}

/// A continuous parameter on a host primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Linear gain factor.
    Gain,
    /// Filter corner or center frequency in Hz.
    Frequency,
    /// Filter quality factor.
    Q,
    /// Filter gain in dB (shelves and peaking).
    FilterGain,
    /// Delay time in seconds.
    DelayTime,
    /// Compressor threshold in dB.
    Threshold,
    /// Compressor knee width in dB.
    Knee,
    /// Compressor ratio.
    Ratio,
    /// Compressor attack in seconds.
    Attack,
    /// Compressor release in seconds.
    Release,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gain => "gain",
            Self::Frequency => "frequency",
            Self::Q => "Q",
            Self::FilterGain => "filter-gain",
            Self::DelayTime => "delay-time",
            Self::Threshold => "threshold",
            Self::Knee => "knee",
            Self::Ratio => "ratio",
            Self::Attack => "attack",
            Self::Release => "release",
        };
        f.write_str(name)
    }
}

/// Planar multichannel sample data.
///
/// Used both for impulse responses and for decoded source material.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a buffer from planar channel data.
    ///
    /// Channels shorter than the longest one are zero-padded.
    pub fn new(sample_rate: f32, mut channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(frames, 0.0);
        }
        Self {
            sample_rate,
            channels,
        }
    }

    /// Creates a silent buffer.
    pub fn silent(sample_rate: f32, channels: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; frames]; channels],
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Playback length.
    pub fn duration(&self) -> Duration {
        if self.sample_rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }
}

/// Errors reported by a host engine.
///
/// Chain routing treats these as transient: they are logged and the rebuild
/// moves on to the next pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node ID was never issued by this host.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node has been released.
    #[error("node {0} has been released")]
    Released(NodeId),

    /// The primitive has no such parameter.
    #[error("{kind} node {node} has no {param} parameter")]
    UnsupportedParam {
        /// Target node.
        node: NodeId,
        /// Primitive label.
        kind: &'static str,
        /// Requested parameter.
        param: ParamKind,
    },

    /// The operation does not apply to this primitive.
    #[error("{operation} is not supported by {kind} node {node}")]
    UnsupportedOperation {
        /// Target node.
        node: NodeId,
        /// Primitive label.
        kind: &'static str,
        /// Operation name.
        operation: &'static str,
    },

    /// The host refused the connection.
    #[error("connection {from} -> {to} refused")]
    ConnectionRefused {
        /// Source node.
        from: NodeId,
        /// Destination node.
        to: NodeId,
    },
}

/// Control-side interface to the audio engine.
///
/// All methods run on the control thread. The engine is free to apply changes
/// to its audio thread however it likes; the board only requires that calls
/// take effect in order.
pub trait AudioHost {
    /// Engine sample rate in Hz.
    fn sample_rate(&self) -> f32;

    /// Monotonic time reference.
    fn now(&self) -> Duration;

    /// The hardware output node.
    fn destination(&self) -> NodeId;

    /// Creates a new primitive.
    fn create(&mut self, kind: PrimitiveKind) -> NodeId;

    /// Adds an edge `from -> to`. Connecting an existing edge is a no-op.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), HostError>;

    /// Removes all outgoing edges of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<(), HostError>;

    /// Sets a continuous parameter.
    fn set_param(&mut self, node: NodeId, param: ParamKind, value: f32) -> Result<(), HostError>;

    /// Reads back a continuous parameter.
    fn param(&self, node: NodeId, param: ParamKind) -> Option<f32>;

    /// Installs a wave-shaper transfer curve.
    fn set_curve(&mut self, node: NodeId, curve: Vec<f32>) -> Result<(), HostError>;

    /// Installs a convolver impulse response.
    fn set_impulse(&mut self, node: NodeId, impulse: AudioBuffer) -> Result<(), HostError>;

    /// Attaches decoded material to a buffer source.
    fn set_buffer(&mut self, node: NodeId, buffer: Arc<AudioBuffer>) -> Result<(), HostError>;

    /// Starts a buffer source at `offset` into its buffer.
    fn start(&mut self, node: NodeId, offset: Duration, looping: bool) -> Result<(), HostError>;

    /// Stops a buffer source or capture.
    fn stop(&mut self, node: NodeId) -> Result<(), HostError>;

    /// Drops a primitive. Its edges in both directions go away with it.
    fn release(&mut self, node: NodeId);
}

/// Convenience constructors layered on any [`AudioHost`].
pub trait HostExt: AudioHost {
    /// Creates a gain stage with an initial gain.
    fn create_gain(&mut self, gain: f32) -> NodeId {
        let node = self.create(PrimitiveKind::Gain);
        self.apply_param(node, ParamKind::Gain, gain);
        node
    }

    /// Creates a filter with an initial frequency and Q.
    fn create_filter(&mut self, filter: FilterType, frequency: f32, q: f32) -> NodeId {
        let node = self.create(PrimitiveKind::Filter(filter));
        self.apply_param(node, ParamKind::Frequency, frequency);
        self.apply_param(node, ParamKind::Q, q);
        node
    }

    /// Sets a parameter, logging instead of failing.
    ///
    /// Parameter writes come from pots and kernels whose targets are known
    /// to exist; a failure here means the node was already released.
    fn apply_param(&mut self, node: NodeId, param: ParamKind, value: f32) {
        if let Err(err) = self.set_param(node, param, value) {
            tracing::warn!(%node, %param, value, error = %err, "parameter write dropped");
        }
    }

    /// Disconnects a node, swallowing errors.
    fn disconnect_quietly(&mut self, node: NodeId) {
        if let Err(err) = self.disconnect(node) {
            tracing::trace!(%node, error = %err, "disconnect ignored");
        }
    }

    /// Connects two nodes, logging a failure instead of returning it.
    ///
    /// Returns whether the edge was made.
    fn connect_logged(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.connect(from, to) {
            Ok(()) => {
                tracing::debug!("connect: {from} -> {to}");
                true
            }
            Err(err) => {
                tracing::warn!(%from, %to, error = %err, "connection failed, continuing");
                false
            }
        }
    }
}

impl<H: AudioHost + ?Sized> HostExt for H {}
