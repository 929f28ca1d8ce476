use voxpaste_core::AudioError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the voxpaste binary.
///
/// All variants include `ErrorLocation` for call-site tracking. The first
/// four variants form the session-pipeline taxonomy: only
/// `EmptyTranscription` and generic native failures interrupt the
/// user-visible flow; `CleanupFailed` is always absorbed by falling back to
/// the raw transcript.
#[derive(Error, Debug)]
pub enum AppError {
    /// Recording was started before a transcription model was loaded.
    #[error("Load a transcription model before recording {location}")]
    ModelNotLoaded {
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Post-trim transcription text was too short to be usable.
    #[error("Could not transcribe audio. Try speaking louder or longer. {location}")]
    EmptyTranscription {
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Text cleanup rejected or returned an unusable result. Never
    /// surfaced to the user; the pipeline keeps the raw transcript.
    #[error("Cleanup failed: {reason} {location}")]
    CleanupFailed {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Any other collaborator failure during the pipeline; stringified
    /// into the session's user-visible error slot.
    #[error("{reason} {location}")]
    NativeCommand {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Audio subsystem error from voxpaste-core.
    #[error("Audio error: {source} {location}")]
    Audio {
        /// The voxpaste-core failure.
        #[source]
        source: AudioError,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// The global-hotkey service rejected a registration.
    #[error("Hotkey registration failed: {reason} {location}")]
    HotkeyRegistrationFailed {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// The clipboard write failed.
    #[error("Failed to copy to clipboard: {reason} {location}")]
    ClipboardError {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// The synthetic paste keystroke could not be delivered.
    #[error("Auto-paste failed: {reason} {location}")]
    AutoPasteFailed {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// A channel or event-loop proxy send failed (receiver gone).
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// What the channel reported.
        message: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// Loading or persisting settings failed.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// What the collaborator reported.
        reason: String,
        /// Call site that produced the error.
        location: ErrorLocation,
    },

    /// A filesystem operation failed.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The std::io failure.
        #[source]
        source: std::io::Error,
        /// Call site that produced the error.
        location: ErrorLocation,
    },
}

impl AppError {
    /// Whether this error carries the empty-transcription meaning for the
    /// pipeline's dedicated short-text recovery path.
    pub fn is_empty_transcription(&self) -> bool {
        matches!(self, AppError::EmptyTranscription { .. })
    }

    /// The message shown in the session's user-visible error slot: the
    /// reason without the source-location suffix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ModelNotLoaded { .. } => {
                "Load a transcription model before recording".to_string()
            }
            AppError::EmptyTranscription { .. } => {
                "Could not transcribe audio. Try speaking louder or longer.".to_string()
            }
            AppError::CleanupFailed { reason, .. } | AppError::NativeCommand { reason, .. } => {
                reason.clone()
            }
            AppError::Audio { source, .. } => format!("Audio error: {}", source),
            other => other.to_string(),
        }
    }
}

// Manual From<AudioError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<AudioError> for AppError {
    #[track_caller]
    fn from(source: AudioError) -> Self {
        AppError::Audio {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
