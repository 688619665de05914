//! Audio capture and encoding
//!
//! This module provides:
//! - Microphone capture through PipeWire at 44.1kHz mono
//! - Single-shot capture sessions with an exclusive microphone handle
//! - In-memory WAV encoding via hound
//! - An on-disk clip archive

mod archive;
mod capture;
mod encoder;
mod session;

pub use archive::{ArchivedClip, ClipArchive};
pub use capture::{CaptureConfig, PipeWireSource};
pub use session::{CaptureSession, ChunkSource, Clip, Microphone};

#[cfg(test)]
pub(crate) use session::testing;
