use error_location::ErrorLocation;
use thiserror::Error;

/// Errors from the capture/resample/transcribe pipeline. Every variant
/// carries the call site that produced it.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The host exposes no audio input device at all.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// A device was requested by name and the enumeration no longer
    /// contains it.
    #[error("Input device not found: {name} {location}")]
    DeviceNotFound {
        /// The name that failed to resolve.
        name: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// The configured Whisper model file is not on disk.
    #[error("Model not found at path: {path:?} {location}")]
    ModelNotFound {
        /// The missing model path.
        path: std::path::PathBuf,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Transcription was requested before any model was loaded.
    #[error("No transcription model loaded {location}")]
    ModelNotLoaded {
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Whisper inference failed.
    #[error("Transcription failed: {source} {location}")]
    TranscriptionFailed {
        /// The whisper-rs failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// A capture finished (or transcription was invoked) with zero
    /// samples.
    #[error("No audio captured {location}")]
    NoAudioCaptured {
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// A CPAL device or stream call failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// What the device layer reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Rate conversion failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// What the resampler reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },
}

/// Result alias for [`AudioError`] fallible operations.
pub type Result<T> = std::result::Result<T, AudioError>;
