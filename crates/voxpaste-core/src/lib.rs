//! VoxPaste Core Library
//!
//! Audio capture and speech-to-text for the VoxPaste dictation app,
//! built on CPAL, Rubato, and Whisper. The Whisper model is loaded lazily
//! so the app can launch before a model has been downloaded.
//!
//! # Example
//!
//! ```no_run
//! use voxpaste_core::{AudioManager, CoreResult};
//!
//! use std::{path::PathBuf, thread::sleep, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let mut manager = AudioManager::new()?;
//!     manager.load_model(&PathBuf::from("models/ggml-base.bin"), true)?;
//!
//!     manager.start_recording()?;
//!     sleep(Duration::from_secs(3));
//!     let samples = manager.stop_recording()?;
//!     let outcome = manager.transcribe(&samples)?;
//!
//!     println!("[{}] {}", outcome.language, outcome.text);
//!     Ok(())
//! }
//! ```

mod audio;
mod error;

pub use {
    audio::{AudioDevice, AudioManager, Transcription},
    error::{AudioError, Result as CoreResult},
};

#[cfg(test)]
mod tests;
