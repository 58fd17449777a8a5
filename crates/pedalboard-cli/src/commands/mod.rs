//! CLI command implementations.

pub mod common;
pub mod pedals;
pub mod play;
pub mod preset;
pub mod topology;
