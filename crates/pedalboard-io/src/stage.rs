//! The stage: input → board → master output.
//!
//! Input switching is two-phase. [`Stage::begin_switch`] stops and unhooks
//! the current input and hands out a [`LoadTicket`]; the matching
//! `complete_*` call installs the new input only if no newer switch has
//! started in between. A superseded result is dropped, never installed, so
//! at most one source is ever live. The async helpers ([`Stage::play`],
//! [`Stage::start_live_input`]) are thin wrappers over the same two phases.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pedalboard_config::Board;
use pedalboard_core::{AudioBuffer, AudioHost, NodeId, PrimitiveKind};

use crate::input::{Input, InputKind};
use crate::loader::{CaptureGrant, CaptureProvider, SourceLoader};
use crate::output::Output;
use crate::{Error, Result};

/// Identifies one input switch. Only the newest ticket can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Switch sequence number.
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Stage notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// A new board was installed.
    BoardChanged,
    /// A new input was installed.
    InputChanged {
        /// What the new input carries.
        kind: InputKind,
    },
    /// The master volume changed.
    VolumeChanged {
        /// New volume, 0–1.
        volume: f32,
    },
}

type StageListener = Box<dyn FnMut(&StageEvent)>;

/// Owns the input, the board and the master output.
pub struct Stage {
    input: Input,
    output: Output,
    board: Option<Board>,
    media_sink: Option<NodeId>,
    generation: u64,
    listeners: Vec<StageListener>,
    disposed: bool,
}

impl Stage {
    /// Creates a stage with an idle input and no board.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let mut stage = Self {
            input: Input::idle(host),
            output: Output::new(host),
            board: None,
            media_sink: None,
            generation: 0,
            listeners: Vec::new(),
            disposed: false,
        };
        stage.route(host);
        stage
    }

    // --- board ---

    /// Installs a board, disposing the previous one.
    pub fn set_board(&mut self, host: &mut dyn AudioHost, mut board: Board) {
        if self.disposed {
            board.dispose(host);
            return;
        }
        if let Some(mut old) = self.board.take() {
            self.input.disconnect(host);
            old.disconnect(host);
            old.dispose(host);
        }
        if let Some(sink) = self.media_sink {
            board.set_media_sink(host, sink);
        }
        self.board = Some(board);
        self.route(host);
        tracing::info!("board installed");
        self.emit(&StageEvent::BoardChanged);
    }

    /// The installed board.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// The installed board, mutably.
    pub fn board_mut(&mut self) -> Option<&mut Board> {
        self.board.as_mut()
    }

    /// Removes the board without disposing it. The input then feeds the
    /// output directly.
    pub fn take_board(&mut self, host: &mut dyn AudioHost) -> Option<Board> {
        let mut board = self.board.take()?;
        self.input.disconnect(host);
        board.disconnect(host);
        self.route(host);
        Some(board)
    }

    /// Wires input → board → output, or input → output without a board.
    pub fn route(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.input.disconnect(host);
        match &mut self.board {
            Some(board) => {
                self.input.connect(host, board.input());
                board.connect(host, self.output.input());
            }
            None => self.input.connect(host, self.output.input()),
        }
    }

    // --- input switching ---

    /// Stops and unhooks the current input and supersedes earlier tickets.
    pub fn begin_switch(&mut self, host: &mut dyn AudioHost) -> LoadTicket {
        self.generation += 1;
        self.input.stop(host);
        self.input.disconnect(host);
        tracing::debug!(generation = self.generation, "input switch started");
        LoadTicket(self.generation)
    }

    /// Returns true if `ticket` belongs to the newest switch.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        !self.disposed && ticket.0 == self.generation
    }

    /// Installs decoded material and starts it from the top.
    pub fn complete_buffer(
        &mut self,
        host: &mut dyn AudioHost,
        ticket: LoadTicket,
        buffer: Arc<AudioBuffer>,
        looping: bool,
    ) -> Result<()> {
        self.check(ticket)?;
        let input = Input::buffer(host, buffer, looping);
        self.install(host, input);
        self.input.play(host, Duration::ZERO);
        Ok(())
    }

    /// Installs a granted capture device.
    pub fn complete_capture(
        &mut self,
        host: &mut dyn AudioHost,
        ticket: LoadTicket,
        grant: CaptureGrant,
    ) -> Result<()> {
        self.check(ticket)?;
        let input = Input::capture(host, grant);
        self.install(host, input);
        Ok(())
    }

    /// Records a failed switch and hands the error back.
    ///
    /// The previous input stays stopped and unhooked.
    pub fn fail_switch(&self, ticket: LoadTicket, err: Error) -> Error {
        if self.is_current(ticket) {
            tracing::warn!(generation = ticket.0, error = %err, "input switch failed");
        } else {
            tracing::debug!(generation = ticket.0, error = %err, "superseded switch failed");
        }
        err
    }

    /// Swaps in a ready-made input, superseding any pending switch.
    pub fn set_input(&mut self, host: &mut dyn AudioHost, mut input: Input) {
        if self.disposed {
            input.dispose(host);
            return;
        }
        let ticket = self.begin_switch(host);
        debug_assert!(self.is_current(ticket));
        self.install(host, input);
    }

    /// Loads `locator` and plays it.
    pub async fn play(
        &mut self,
        host: &mut dyn AudioHost,
        loader: &dyn SourceLoader,
        locator: &str,
    ) -> Result<()> {
        let ticket = self.begin_switch(host);
        match loader.load(locator).await {
            Ok(buffer) => self.complete_buffer(host, ticket, Arc::new(buffer), false),
            Err(err) => Err(self.fail_switch(ticket, err)),
        }
    }

    /// Loads a file and plays it.
    pub async fn play_file(
        &mut self,
        host: &mut dyn AudioHost,
        loader: &dyn SourceLoader,
        path: &Path,
    ) -> Result<()> {
        self.play(host, loader, &path.to_string_lossy()).await
    }

    /// Acquires a capture device (the default if `device` is `None`) and
    /// routes it through the board.
    pub async fn start_live_input(
        &mut self,
        host: &mut dyn AudioHost,
        provider: &dyn CaptureProvider,
        device: Option<&str>,
    ) -> Result<()> {
        let ticket = self.begin_switch(host);
        match provider.acquire(device).await {
            Ok(grant) => self.complete_capture(host, ticket, grant),
            Err(err) => Err(self.fail_switch(ticket, err)),
        }
    }

    /// Re-acquires the current live device, or the default if the input
    /// is not live.
    pub async fn restart_live_input(
        &mut self,
        host: &mut dyn AudioHost,
        provider: &dyn CaptureProvider,
    ) -> Result<()> {
        let device = self.input.device().flatten().map(str::to_string);
        self.start_live_input(host, provider, device.as_deref()).await
    }

    /// Switches live input to another device.
    pub async fn switch_device(
        &mut self,
        host: &mut dyn AudioHost,
        provider: &dyn CaptureProvider,
        device: &str,
    ) -> Result<()> {
        self.start_live_input(host, provider, Some(device)).await
    }

    // --- playback ---

    /// The current input.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Stops the current input.
    pub fn stop(&mut self, host: &mut dyn AudioHost) {
        self.input.stop(host);
    }

    /// Pauses buffer playback.
    pub fn pause(&mut self, host: &mut dyn AudioHost) {
        self.input.pause(host);
    }

    /// Resumes paused buffer playback.
    pub fn resume(&mut self, host: &mut dyn AudioHost) {
        self.input.resume(host);
    }

    /// Moves the playhead.
    pub fn seek(&mut self, host: &mut dyn AudioHost, position: Duration) {
        self.input.seek(host, position);
    }

    /// Sets looping on buffer playback.
    pub fn set_loop(&mut self, host: &mut dyn AudioHost, looping: bool) {
        self.input.set_loop(host, looping);
    }

    /// Returns true while the input produces signal.
    pub fn is_playing(&self) -> bool {
        self.input.is_playing()
    }

    /// Playhead position of the current input.
    pub fn current_time(&self, host: &dyn AudioHost) -> Duration {
        self.input.current_time(host)
    }

    /// Length of the current input's material.
    pub fn duration(&self) -> Duration {
        self.input.duration()
    }

    // --- output ---

    /// The master output.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// The master output, mutably.
    pub fn output_mut(&mut self) -> &mut Output {
        &mut self.output
    }

    /// Sets the master volume, clamped to 0–1.
    pub fn set_volume(&mut self, host: &mut dyn AudioHost, volume: f32) {
        self.output.set_volume(host, volume);
        let volume = self.output.volume();
        self.emit(&StageEvent::VolumeChanged { volume });
    }

    /// Master volume.
    pub fn volume(&self) -> f32 {
        self.output.volume()
    }

    /// A stream sink fed by the board output, created on first call.
    pub fn media_stream_destination(&mut self, host: &mut dyn AudioHost) -> NodeId {
        if let Some(sink) = self.media_sink {
            return sink;
        }
        let sink = host.create(PrimitiveKind::StreamSink);
        self.media_sink = Some(sink);
        if let Some(board) = &mut self.board {
            board.set_media_sink(host, sink);
        }
        sink
    }

    // --- lifecycle ---

    /// Fires due switch releases and ends finished playback.
    ///
    /// Returns true if anything changed.
    pub fn tick(&mut self, host: &mut dyn AudioHost) -> bool {
        let released = self.board.as_mut().is_some_and(|board| board.tick(host));
        let ended = self.input.poll(host);
        released || ended
    }

    /// Registers a listener for stage events.
    pub fn subscribe(&mut self, listener: impl FnMut(&StageEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tears everything down. Pending switches can no longer complete.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.input.dispose(host);
        self.output.dispose(host);
        if let Some(mut board) = self.board.take() {
            board.dispose(host);
        }
        if let Some(sink) = self.media_sink.take() {
            host.release(sink);
        }
        self.listeners.clear();
        self.disposed = true;
    }

    fn check(&self, ticket: LoadTicket) -> Result<()> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            tracing::debug!(
                generation = ticket.0,
                current = self.generation,
                "dropping superseded input"
            );
            Err(Error::Superseded)
        }
    }

    fn install(&mut self, host: &mut dyn AudioHost, input: Input) {
        let mut previous = std::mem::replace(&mut self.input, input);
        previous.dispose(host);
        self.route(host);
        let kind = self.input.kind();
        tracing::info!(?kind, "input switched");
        self.emit(&StageEvent::InputChanged { kind });
    }

    fn emit(&mut self, event: &StageEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("input", &self.input.kind())
            .field("board", &self.board.as_ref().map(Board::len))
            .field("volume", &self.output.volume())
            .field("generation", &self.generation)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::SignalGraph;

    const RATE: f32 = 1000.0;

    fn material() -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::silent(RATE, 1, 1000))
    }

    #[test]
    fn test_new_stage_routes_input_to_output() {
        let mut graph = SignalGraph::new(RATE);
        let stage = Stage::new(&mut graph);
        assert!(graph.is_connected(stage.input().output(), stage.output().input()));
        assert!(graph.reachable(stage.input().output(), graph.destination()));
    }

    #[test]
    fn test_set_board_routes_through_board() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let board = Board::new(&mut graph);
        let (board_in, board_out) = (board.input(), board.output());
        stage.set_board(&mut graph, board);

        assert_eq!(graph.successors(stage.input().output()), vec![board_in]);
        assert!(graph.is_connected(board_out, stage.output().input()));
    }

    #[test]
    fn test_replacing_board_disposes_old_one() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let first = Board::new(&mut graph);
        let first_in = first.input();
        stage.set_board(&mut graph, first);
        let second = Board::new(&mut graph);
        stage.set_board(&mut graph, second);

        assert!(graph.is_released(first_in));
        assert!(!graph.is_connected(stage.input().output(), first_in));
    }

    #[test]
    fn test_take_board_restores_direct_path() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let board = Board::new(&mut graph);
        stage.set_board(&mut graph, board);
        let board = stage.take_board(&mut graph).unwrap();

        assert!(!board.is_disposed());
        assert_eq!(board.downstream(), None);
        assert!(graph.is_connected(stage.input().output(), stage.output().input()));
    }

    #[test]
    fn test_stale_ticket_is_superseded() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let first = stage.begin_switch(&mut graph);
        let second = stage.begin_switch(&mut graph);
        assert!(!stage.is_current(first));

        let err = stage
            .complete_buffer(&mut graph, first, material(), false)
            .unwrap_err();
        assert!(matches!(err, Error::Superseded));
        assert_eq!(stage.input().kind(), InputKind::Idle);

        stage
            .complete_buffer(&mut graph, second, material(), false)
            .unwrap();
        assert_eq!(stage.input().kind(), InputKind::Buffer);
        assert!(stage.is_playing());
    }

    #[test]
    fn test_failed_switch_leaves_previous_input_stopped() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let ticket = stage.begin_switch(&mut graph);
        stage
            .complete_buffer(&mut graph, ticket, material(), false)
            .unwrap();
        assert!(stage.is_playing());

        let ticket = stage.begin_switch(&mut graph);
        let err = stage.fail_switch(ticket, Error::PermissionDenied);
        assert!(matches!(err, Error::PermissionDenied));
        assert!(!stage.is_playing());
        assert!(graph.successors(stage.input().output()).is_empty());
    }

    #[test]
    fn test_set_input_supersedes_pending_switch() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let pending = stage.begin_switch(&mut graph);
        let ready = Input::buffer(&mut graph, material(), true);
        stage.set_input(&mut graph, ready);

        assert!(!stage.is_current(pending));
        assert_eq!(stage.input().kind(), InputKind::Buffer);
        assert!(graph.is_connected(stage.input().output(), stage.output().input()));
    }

    #[test]
    fn test_media_stream_destination_follows_board() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let sink = stage.media_stream_destination(&mut graph);
        assert_eq!(stage.media_stream_destination(&mut graph), sink);

        let board = Board::new(&mut graph);
        let board_out = board.output();
        stage.set_board(&mut graph, board);
        assert!(graph.is_connected(board_out, sink));
        assert!(graph.is_connected(board_out, stage.output().input()));
    }

    #[test]
    fn test_tick_ends_playback() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let ticket = stage.begin_switch(&mut graph);
        stage
            .complete_buffer(&mut graph, ticket, material(), false)
            .unwrap();

        graph.advance(Duration::from_secs(2));
        assert!(stage.tick(&mut graph));
        assert!(!stage.is_playing());
        assert!(!stage.tick(&mut graph));
    }

    #[test]
    fn test_dispose_rejects_pending_switch() {
        let mut graph = SignalGraph::new(RATE);
        let mut stage = Stage::new(&mut graph);
        let board = Board::new(&mut graph);
        stage.set_board(&mut graph, board);
        let ticket = stage.begin_switch(&mut graph);
        stage.dispose(&mut graph);
        stage.dispose(&mut graph);

        assert!(matches!(
            stage.complete_buffer(&mut graph, ticket, material(), false),
            Err(Error::Superseded)
        ));
        assert_eq!(graph.live_nodes(), 1);
    }
}
