//! Signal sources feeding the stage.
//!
//! An [`Input`] always owns one output gain node. Behind it sits at most one
//! [`Source`]: decoded material played from a buffer, or a live capture.
//! Buffer source primitives are one-shot, so every start creates a fresh node
//! and every stop releases it.

use std::sync::Arc;
use std::time::Duration;

use pedalboard_core::{AudioBuffer, AudioHost, HostExt, NodeId, ParamKind, PrimitiveKind};

use crate::loader::CaptureGrant;

/// Gain applied to live capture before it reaches the board.
pub const CAPTURE_INPUT_GAIN: f32 = 3.0;

/// Which kind of source an input carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// No source attached.
    Idle,
    /// Decoded buffer playback.
    Buffer,
    /// Live capture.
    Capture,
}

/// Buffer playback state.
#[derive(Debug)]
pub struct BufferSource {
    buffer: Arc<AudioBuffer>,
    node: Option<NodeId>,
    looping: bool,
    started_at: Duration,
    offset: Duration,
    paused_at: Option<Duration>,
}

/// Live capture chain: capture → input gain → analyser.
#[derive(Debug)]
pub struct CaptureSource {
    device: Option<String>,
    label: String,
    capture: NodeId,
    input_gain: NodeId,
    analyser: NodeId,
    running: bool,
}

/// The material behind an input.
#[derive(Debug)]
pub enum Source {
    /// Decoded material.
    Buffer(BufferSource),
    /// Live device.
    Capture(CaptureSource),
}

/// A source plus its output gain.
#[derive(Debug)]
pub struct Input {
    output: NodeId,
    volume: f32,
    source: Option<Source>,
    disposed: bool,
}

impl Input {
    /// An input with no source. Produces silence.
    pub fn idle(host: &mut dyn AudioHost) -> Self {
        Self {
            output: host.create_gain(1.0),
            volume: 1.0,
            source: None,
            disposed: false,
        }
    }

    /// An input that plays `buffer`. Nothing sounds until [`play`](Self::play).
    pub fn buffer(host: &mut dyn AudioHost, buffer: Arc<AudioBuffer>, looping: bool) -> Self {
        let mut input = Self::idle(host);
        input.source = Some(Source::Buffer(BufferSource {
            buffer,
            node: None,
            looping,
            started_at: Duration::ZERO,
            offset: Duration::ZERO,
            paused_at: None,
        }));
        input
    }

    /// An input wired to a granted capture device and started.
    pub fn capture(host: &mut dyn AudioHost, grant: CaptureGrant) -> Self {
        let mut input = Self::idle(host);
        let capture = host.create(PrimitiveKind::Capture {
            device: grant.device.clone(),
        });
        let input_gain = host.create_gain(CAPTURE_INPUT_GAIN);
        let analyser = host.create(PrimitiveKind::Analyser);
        host.connect_logged(capture, input_gain);
        host.connect_logged(input_gain, analyser);
        host.connect_logged(analyser, input.output);

        let mut source = CaptureSource {
            device: grant.device,
            label: grant.label,
            capture,
            input_gain,
            analyser,
            running: false,
        };
        source.start(host);
        input.source = Some(Source::Capture(source));
        input
    }

    /// The output gain node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// What this input carries.
    pub fn kind(&self) -> InputKind {
        match self.source {
            None => InputKind::Idle,
            Some(Source::Buffer(_)) => InputKind::Buffer,
            Some(Source::Capture(_)) => InputKind::Capture,
        }
    }

    /// The attached source.
    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// Capture device of a live input. `Some(None)` is the system default.
    pub fn device(&self) -> Option<Option<&str>> {
        match &self.source {
            Some(Source::Capture(capture)) => Some(capture.device.as_deref()),
            _ => None,
        }
    }

    /// Routes the output gain into `destination`.
    pub fn connect(&mut self, host: &mut dyn AudioHost, destination: NodeId) {
        if self.disposed {
            return;
        }
        host.connect_logged(self.output, destination);
    }

    /// Unhooks the output gain from everything downstream.
    pub fn disconnect(&mut self, host: &mut dyn AudioHost) {
        host.disconnect_quietly(self.output);
    }

    /// Sets the input volume, clamped to 0–1.
    pub fn set_volume(&mut self, host: &mut dyn AudioHost, volume: f32) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        host.apply_param(self.output, ParamKind::Gain, self.volume);
    }

    /// Input volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Returns true while the source is producing signal.
    pub fn is_playing(&self) -> bool {
        match &self.source {
            None => false,
            Some(Source::Buffer(buffer)) => buffer.node.is_some(),
            Some(Source::Capture(capture)) => capture.running,
        }
    }

    /// Starts buffer playback at `offset`, clamped to the duration.
    ///
    /// Restarts if already playing. Live inputs restart their capture.
    pub fn play(&mut self, host: &mut dyn AudioHost, offset: Duration) {
        if self.disposed {
            return;
        }
        let output = self.output;
        match &mut self.source {
            None => tracing::debug!("play on idle input ignored"),
            Some(Source::Buffer(buffer)) => buffer.start(host, output, offset),
            Some(Source::Capture(capture)) => capture.start(host),
        }
    }

    /// Stops the source and forgets any pause position.
    pub fn stop(&mut self, host: &mut dyn AudioHost) {
        match &mut self.source {
            None => {}
            Some(Source::Buffer(buffer)) => {
                buffer.halt(host);
                buffer.paused_at = None;
            }
            Some(Source::Capture(capture)) => capture.stop(host),
        }
    }

    /// Stops buffer playback and remembers where it was.
    pub fn pause(&mut self, host: &mut dyn AudioHost) {
        if let Some(Source::Buffer(buffer)) = &mut self.source
            && buffer.node.is_some()
        {
            let position = buffer.position(host.now());
            buffer.halt(host);
            buffer.paused_at = Some(position);
        }
    }

    /// Resumes buffer playback from the pause position.
    pub fn resume(&mut self, host: &mut dyn AudioHost) {
        let output = self.output;
        if let Some(Source::Buffer(buffer)) = &mut self.source
            && buffer.node.is_none()
            && let Some(position) = buffer.paused_at.take()
        {
            buffer.start(host, output, position);
        }
    }

    /// Moves the playhead, clamped to the duration.
    ///
    /// A playing source restarts from the new position; a stopped one starts
    /// there on the next [`resume`](Self::resume).
    pub fn seek(&mut self, host: &mut dyn AudioHost, position: Duration) {
        let output = self.output;
        if let Some(Source::Buffer(buffer)) = &mut self.source {
            let position = position.min(buffer.buffer.duration());
            if buffer.node.is_some() {
                buffer.start(host, output, position);
            } else {
                buffer.paused_at = Some(position);
            }
        }
    }

    /// Sets looping. A playing source restarts in place with the new mode.
    pub fn set_loop(&mut self, host: &mut dyn AudioHost, looping: bool) {
        let output = self.output;
        if let Some(Source::Buffer(buffer)) = &mut self.source {
            if buffer.looping == looping {
                return;
            }
            buffer.looping = looping;
            if buffer.node.is_some() {
                let position = buffer.position(host.now());
                buffer.start(host, output, position);
            }
        }
    }

    /// Returns true if the buffer loops.
    pub fn is_looping(&self) -> bool {
        matches!(&self.source, Some(Source::Buffer(buffer)) if buffer.looping)
    }

    /// Length of the loaded material. Zero for live and idle inputs.
    pub fn duration(&self) -> Duration {
        match &self.source {
            Some(Source::Buffer(buffer)) => buffer.buffer.duration(),
            _ => Duration::ZERO,
        }
    }

    /// Playhead position.
    pub fn current_time(&self, host: &dyn AudioHost) -> Duration {
        match &self.source {
            Some(Source::Buffer(buffer)) if buffer.node.is_some() => buffer.position(host.now()),
            Some(Source::Buffer(buffer)) => buffer.paused_at.unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        }
    }

    /// Stops a non-looping buffer that has run past its end.
    ///
    /// Returns true if playback ended on this call.
    pub fn poll(&mut self, host: &mut dyn AudioHost) -> bool {
        let Some(Source::Buffer(buffer)) = &mut self.source else {
            return false;
        };
        if buffer.node.is_none() || buffer.looping {
            return false;
        }
        let elapsed = buffer.offset + host.now().saturating_sub(buffer.started_at);
        if elapsed < buffer.buffer.duration() {
            return false;
        }
        buffer.halt(host);
        buffer.paused_at = None;
        tracing::debug!("buffer playback ended");
        true
    }

    /// Stops the source and releases every node. Safe to call twice.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.stop(host);
        if let Some(Source::Capture(capture)) = &self.source {
            for node in [capture.capture, capture.input_gain, capture.analyser] {
                host.release(node);
            }
        }
        self.source = None;
        host.release(self.output);
        self.disposed = true;
    }
}

impl BufferSource {
    /// The decoded material.
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// The live source node, while playing.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn start(&mut self, host: &mut dyn AudioHost, output: NodeId, offset: Duration) {
        self.halt(host);
        let offset = offset.min(self.buffer.duration());
        let node = host.create(PrimitiveKind::BufferSource);
        if let Err(err) = host.set_buffer(node, Arc::clone(&self.buffer)) {
            tracing::warn!(%node, error = %err, "buffer not attached");
        }
        host.connect_logged(node, output);
        if let Err(err) = host.start(node, offset, self.looping) {
            tracing::warn!(%node, error = %err, "buffer source failed to start");
        }
        self.node = Some(node);
        self.started_at = host.now();
        self.offset = offset;
        self.paused_at = None;
    }

    fn halt(&mut self, host: &mut dyn AudioHost) {
        if let Some(node) = self.node.take() {
            if let Err(err) = host.stop(node) {
                tracing::trace!(%node, error = %err, "stop ignored");
            }
            host.release(node);
        }
    }

    fn position(&self, now: Duration) -> Duration {
        let duration = self.buffer.duration();
        let elapsed = self.offset + now.saturating_sub(self.started_at);
        if duration.is_zero() {
            Duration::ZERO
        } else if self.looping {
            Duration::from_nanos((elapsed.as_nanos() % duration.as_nanos()) as u64)
        } else {
            elapsed.min(duration)
        }
    }
}

impl CaptureSource {
    /// Device identifier, `None` for the system default.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Human-readable device label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The capture primitive.
    pub fn capture_node(&self) -> NodeId {
        self.capture
    }

    /// The boost stage behind the capture.
    pub fn input_gain(&self) -> NodeId {
        self.input_gain
    }

    /// Level-metering tap.
    pub fn analyser(&self) -> NodeId {
        self.analyser
    }

    fn start(&mut self, host: &mut dyn AudioHost) {
        if let Err(err) = host.start(self.capture, Duration::ZERO, false) {
            tracing::warn!(node = %self.capture, error = %err, "capture failed to start");
            return;
        }
        self.running = true;
    }

    fn stop(&mut self, host: &mut dyn AudioHost) {
        if !self.running {
            return;
        }
        if let Err(err) = host.stop(self.capture) {
            tracing::trace!(node = %self.capture, error = %err, "stop ignored");
        }
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::SignalGraph;

    const RATE: f32 = 1000.0;

    /// Two seconds of silence.
    fn two_seconds() -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::silent(RATE, 2, 2000))
    }

    fn source_node(input: &Input) -> Option<NodeId> {
        match input.source() {
            Some(Source::Buffer(buffer)) => buffer.node(),
            _ => None,
        }
    }

    #[test]
    fn test_idle_input() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::idle(&mut graph);
        input.play(&mut graph, Duration::ZERO);
        assert_eq!(input.kind(), InputKind::Idle);
        assert!(!input.is_playing());
        assert_eq!(input.duration(), Duration::ZERO);
    }

    #[test]
    fn test_buffer_play_connects_fresh_source() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.play(&mut graph, Duration::from_millis(500));

        let node = source_node(&input).unwrap();
        assert!(graph.is_connected(node, input.output()));
        let playback = graph.playback(node).unwrap();
        assert_eq!(playback.offset, Duration::from_millis(500));
        assert!(!playback.looping);

        input.play(&mut graph, Duration::ZERO);
        assert!(graph.is_released(node));
        assert_ne!(source_node(&input), Some(node));
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.play(&mut graph, Duration::ZERO);
        graph.advance(Duration::from_millis(700));

        input.pause(&mut graph);
        assert!(!input.is_playing());
        assert_eq!(input.current_time(&graph), Duration::from_millis(700));

        graph.advance(Duration::from_secs(5));
        input.resume(&mut graph);
        assert!(input.is_playing());
        let node = source_node(&input).unwrap();
        assert_eq!(
            graph.playback(node).unwrap().offset,
            Duration::from_millis(700)
        );
    }

    #[test]
    fn test_stop_forgets_position() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.play(&mut graph, Duration::from_secs(1));
        input.stop(&mut graph);
        input.resume(&mut graph);
        assert!(!input.is_playing());
        assert_eq!(input.current_time(&graph), Duration::ZERO);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.seek(&mut graph, Duration::from_secs(9));
        assert_eq!(input.current_time(&graph), Duration::from_secs(2));

        input.play(&mut graph, Duration::ZERO);
        input.seek(&mut graph, Duration::from_millis(250));
        assert!(input.is_playing());
        assert_eq!(input.current_time(&graph), Duration::from_millis(250));
    }

    #[test]
    fn test_looping_position_wraps() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), true);
        input.play(&mut graph, Duration::ZERO);
        graph.advance(Duration::from_millis(2500));
        assert_eq!(input.current_time(&graph), Duration::from_millis(500));
        assert!(!input.poll(&mut graph));
        assert!(input.is_playing());
    }

    #[test]
    fn test_poll_ends_one_shot_playback() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.play(&mut graph, Duration::ZERO);
        graph.advance(Duration::from_millis(1999));
        assert!(!input.poll(&mut graph));
        graph.advance(Duration::from_millis(1));
        assert!(input.poll(&mut graph));
        assert!(!input.is_playing());
    }

    #[test]
    fn test_set_loop_restarts_in_place() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::buffer(&mut graph, two_seconds(), false);
        input.play(&mut graph, Duration::ZERO);
        graph.advance(Duration::from_millis(300));
        input.set_loop(&mut graph, true);

        assert!(input.is_looping());
        let playback = graph.playback(source_node(&input).unwrap()).unwrap();
        assert!(playback.looping);
        assert_eq!(playback.offset, Duration::from_millis(300));
    }

    #[test]
    fn test_capture_chain_and_gain() {
        let mut graph = SignalGraph::new(RATE);
        let grant = CaptureGrant {
            device: Some("usb-1".to_string()),
            label: "USB Interface".to_string(),
        };
        let mut input = Input::capture(&mut graph, grant);
        assert_eq!(input.kind(), InputKind::Capture);
        assert_eq!(input.device(), Some(Some("usb-1")));
        assert!(input.is_playing());

        let Some(Source::Capture(capture)) = input.source() else {
            panic!("expected capture source");
        };
        assert_eq!(
            graph.param(capture.input_gain(), ParamKind::Gain),
            Some(CAPTURE_INPUT_GAIN)
        );
        let path = graph
            .linear_path(capture.capture_node(), input.output())
            .unwrap();
        assert_eq!(path.len(), 4);

        input.stop(&mut graph);
        assert!(!input.is_playing());
    }

    #[test]
    fn test_volume_clamps() {
        let mut graph = SignalGraph::new(RATE);
        let mut input = Input::idle(&mut graph);
        input.set_volume(&mut graph, 3.0);
        assert_eq!(input.volume(), 1.0);
        assert_eq!(graph.param(input.output(), ParamKind::Gain), Some(1.0));
    }

    #[test]
    fn test_dispose_releases_everything() {
        let mut graph = SignalGraph::new(RATE);
        let before = graph.live_nodes();
        let grant = CaptureGrant {
            device: None,
            label: "default".to_string(),
        };
        let mut input = Input::capture(&mut graph, grant);
        input.dispose(&mut graph);
        input.dispose(&mut graph);
        assert_eq!(graph.live_nodes(), before);
    }
}
