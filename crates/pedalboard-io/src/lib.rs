//! Stage, input sources and master output for pedalboard.
//!
//! This crate provides:
//!
//! - **Stage**: [`Stage`] wires input → board → master output and owns input switching
//! - **Inputs**: [`Input`] plays decoded buffers or live capture
//! - **Output**: [`Output`] is the compressor/limiter/volume master chain
//! - **Loaders**: [`SourceLoader`] and [`CaptureProvider`] are the async edges;
//!   [`WavLoader`] decodes WAV files with `hound`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pedalboard_config::{Board, get_factory_preset};
//! use pedalboard_core::SignalGraph;
//! use pedalboard_io::{Stage, WavLoader};
//! use pedalboard_registry::PedalRegistry;
//!
//! let mut graph = SignalGraph::new(48000.0);
//! let mut stage = Stage::new(&mut graph);
//!
//! let mut board = Board::new(&mut graph);
//! board.deserialize(&mut graph, &get_factory_preset("crunch").unwrap(), &PedalRegistry::new())?;
//! stage.set_board(&mut graph, board);
//!
//! stage.play(&mut graph, &WavLoader::new(), "riff.wav").await?;
//! ```

mod input;
mod loader;
mod output;
mod stage;

pub use input::{BufferSource, CAPTURE_INPUT_GAIN, CaptureSource, Input, InputKind, Source};
pub use loader::{
    CaptureGrant, CaptureProvider, DeviceCatalog, SourceLoader, WavLoader, decode_wav_bytes,
    read_wav,
};
pub use output::{Dynamics, Output};
pub use stage::{LoadTicket, Stage, StageEvent};

/// Error types for stage I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The material decoded but cannot be played.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The user or platform refused access to the capture device.
    #[error("Permission to capture audio was denied")]
    PermissionDenied,

    /// The requested capture device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A newer input switch started before this one completed.
    #[error("Input switch superseded by a newer request")]
    Superseded,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background decode task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenience result type for stage I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
