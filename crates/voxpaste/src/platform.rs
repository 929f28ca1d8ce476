//! Contracts the session orchestrator expects from native collaborators.
//!
//! Every OS-facing service (audio, speech-to-text, text cleanup, the
//! overlay surface, clipboard/paste delivery, global-hotkey registration,
//! settings persistence) is consumed through one of these traits.
//! Responses are validated once at this boundary and arrive as typed
//! results; nothing downstream re-checks collaborator shapes. Tests drive
//! the orchestrator with in-memory implementations.

use crate::{
    AppResult, HotkeyBinding, OverlayState, TranscriptRecord, devices::AudioDeviceDescriptor,
};

use std::path::Path;

use voxpaste_core::{AudioDevice, AudioManager, Transcription};

/// Microphone capture: push-to-talk start/finalize plus device selection.
pub trait AudioCapture: Send {
    /// Begin capturing from the active input device.
    fn start_capture(&mut self) -> AppResult<()>;
    /// Finalize capture and return 16kHz mono samples.
    fn stop_capture(&mut self) -> AppResult<Vec<f32>>;
    /// Switch the input device; `None` selects the system default.
    fn set_input_device(&mut self, device_id: Option<&str>) -> AppResult<()>;
    /// Enumerate currently available input devices.
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor>;
}

/// Speech-to-text inference with lazy model loading.
pub trait SpeechToText: Send {
    fn is_model_loaded(&self) -> bool;
    fn load_model(&mut self, path: &Path, use_gpu: bool) -> AppResult<()>;
    fn transcribe(&mut self, samples: &[f32]) -> AppResult<Transcription>;
}

/// LLM transcript cleanup. Availability gates non-default output modes;
/// the enabled flag gates the pipeline's cleanup step.
pub trait TextCleanup: Send {
    fn is_available(&self) -> bool;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn cleanup(&self, text: &str, language: &str, mode_id: &str) -> AppResult<String>;
}

/// The transient session-status overlay. `hide` must be idempotent: the
/// orchestrator issues it on every error recovery without checking
/// visibility first.
pub trait OverlaySurface: Send {
    fn show(&mut self, state: OverlayState, mode_id: &str) -> AppResult<()>;
    fn set_state(&mut self, state: OverlayState) -> AppResult<()>;
    fn set_mode(&mut self, mode_id: &str) -> AppResult<()>;
    fn hide(&mut self) -> AppResult<()>;
}

/// Clipboard, recent-transcript surfacing, and paste simulation.
pub trait TextDelivery: Send {
    fn copy_to_clipboard(&mut self, text: &str) -> AppResult<()>;
    fn notify_recent_transcript(&mut self, text: &str) -> AppResult<()>;
    fn simulate_paste(&mut self) -> AppResult<()>;
}

/// Global-hotkey (de)registration. Inbound press/release events arrive
/// through the app's command channel, not through this trait.
pub trait HotkeyRegistrar: Send {
    fn register(&mut self, binding: &HotkeyBinding) -> AppResult<()>;
    fn unregister_all(&mut self) -> AppResult<()>;
}

/// Key-value persistence surviving restarts. Every mutation of a
/// persisted setting calls straight through; durability is best-effort,
/// so most callers log a failed save and carry on.
pub trait SettingsStore: Send {
    fn save_binding(&mut self, binding: &HotkeyBinding) -> AppResult<()>;
    fn save_hotkey_enabled(&mut self, enabled: bool) -> AppResult<()>;
    fn save_cleanup_enabled(&mut self, enabled: bool) -> AppResult<()>;
    fn save_selected_device(&mut self, device_id: Option<&str>) -> AppResult<()>;
    fn save_selected_mode(&mut self, mode_id: &str) -> AppResult<()>;
    fn save_history(&mut self, records: &[TranscriptRecord]) -> AppResult<()>;
    fn load_history(&self) -> AppResult<Vec<TranscriptRecord>>;
}

impl AudioCapture for AudioManager {
    fn start_capture(&mut self) -> AppResult<()> {
        self.start_recording()?;
        Ok(())
    }

    fn stop_capture(&mut self) -> AppResult<Vec<f32>> {
        Ok(self.stop_recording()?)
    }

    fn set_input_device(&mut self, device_id: Option<&str>) -> AppResult<()> {
        AudioManager::set_input_device(self, device_id)?;
        Ok(())
    }

    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        AudioManager::list_input_devices(self)
            .into_iter()
            .map(|AudioDevice { id, name }| AudioDeviceDescriptor { id: Some(id), name })
            .collect()
    }
}

impl SpeechToText for AudioManager {
    fn is_model_loaded(&self) -> bool {
        AudioManager::is_model_loaded(self)
    }

    fn load_model(&mut self, path: &Path, use_gpu: bool) -> AppResult<()> {
        AudioManager::load_model(self, path, use_gpu)?;
        Ok(())
    }

    fn transcribe(&mut self, samples: &[f32]) -> AppResult<Transcription> {
        Ok(AudioManager::transcribe(self, samples)?)
    }
}
