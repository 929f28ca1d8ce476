//! In-memory collaborator implementations for orchestrator tests.

use crate::{
    AppError, AppResult, HistoryStore, HotkeyBinding, OverlayCoordinator, OverlayState,
    SessionStateMachine, TranscriptRecord,
    devices::AudioDeviceDescriptor,
    platform::{
        AudioCapture, HotkeyRegistrar, OverlaySurface, SettingsStore, SpeechToText, TextCleanup,
        TextDelivery,
    },
};

use std::{
    panic::Location,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::sync::Mutex as AsyncMutex;
use voxpaste_core::Transcription;

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

#[allow(clippy::unwrap_used)]
pub(crate) fn log_push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

#[allow(clippy::unwrap_used)]
pub(crate) fn log_entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[track_caller]
fn native(reason: &str) -> AppError {
    AppError::NativeCommand {
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

pub(crate) struct MockAudio {
    pub log: Log,
    pub samples: Vec<f32>,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub devices: Vec<AudioDeviceDescriptor>,
}

impl AudioCapture for MockAudio {
    fn start_capture(&mut self) -> AppResult<()> {
        log_push(&self.log, "start");
        if self.fail_start {
            return Err(native("capture refused to start"));
        }
        Ok(())
    }

    fn stop_capture(&mut self) -> AppResult<Vec<f32>> {
        log_push(&self.log, "stop");
        if self.fail_stop {
            return Err(native("capture refused to stop"));
        }
        Ok(self.samples.clone())
    }

    fn set_input_device(&mut self, device_id: Option<&str>) -> AppResult<()> {
        log_push(&self.log, format!("select:{:?}", device_id));
        Ok(())
    }

    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        self.devices.clone()
    }
}

pub(crate) struct MockStt {
    pub loaded: bool,
    pub text: String,
    pub language: String,
    pub fail: bool,
}

impl SpeechToText for MockStt {
    fn is_model_loaded(&self) -> bool {
        self.loaded
    }

    fn load_model(&mut self, _path: &Path, _use_gpu: bool) -> AppResult<()> {
        self.loaded = true;
        Ok(())
    }

    fn transcribe(&mut self, _samples: &[f32]) -> AppResult<Transcription> {
        if self.fail {
            return Err(native("inference exploded"));
        }
        Ok(Transcription {
            text: self.text.clone(),
            language: self.language.clone(),
        })
    }
}

pub(crate) struct MockCleanup {
    pub available: bool,
    pub enabled: bool,
    pub reply: Result<String, String>,
    pub calls: Log,
}

impl TextCleanup for MockCleanup {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn cleanup(&self, text: &str, language: &str, mode_id: &str) -> AppResult<String> {
        log_push(&self.calls, format!("{}|{}|{}", text, language, mode_id));
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(reason) => Err(AppError::CleanupFailed {
                reason: reason.clone(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

pub(crate) struct MockOverlay {
    pub log: Log,
    pub fail_hide: bool,
}

impl OverlaySurface for MockOverlay {
    fn show(&mut self, state: OverlayState, mode_id: &str) -> AppResult<()> {
        log_push(&self.log, format!("show:{}:{}", state.as_str(), mode_id));
        Ok(())
    }

    fn set_state(&mut self, state: OverlayState) -> AppResult<()> {
        log_push(&self.log, format!("state:{}", state.as_str()));
        Ok(())
    }

    fn set_mode(&mut self, mode_id: &str) -> AppResult<()> {
        log_push(&self.log, format!("mode:{}", mode_id));
        Ok(())
    }

    fn hide(&mut self) -> AppResult<()> {
        log_push(&self.log, "hide");
        if self.fail_hide {
            return Err(native("overlay hide failed"));
        }
        Ok(())
    }
}

pub(crate) struct MockDelivery {
    pub log: Log,
    pub clipboard: Arc<Mutex<Option<String>>>,
    pub pastes: Arc<AtomicUsize>,
    pub fail_copy: bool,
}

impl TextDelivery for MockDelivery {
    #[allow(clippy::unwrap_used)]
    fn copy_to_clipboard(&mut self, text: &str) -> AppResult<()> {
        if self.fail_copy {
            return Err(native("clipboard unavailable"));
        }
        *self.clipboard.lock().unwrap() = Some(text.to_string());
        log_push(&self.log, "copy");
        Ok(())
    }

    fn notify_recent_transcript(&mut self, text: &str) -> AppResult<()> {
        log_push(&self.log, format!("notify:{}", text));
        Ok(())
    }

    fn simulate_paste(&mut self) -> AppResult<()> {
        self.pastes.fetch_add(1, Ordering::SeqCst);
        log_push(&self.log, "paste");
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub saves: Vec<String>,
    pub binding: Option<HotkeyBinding>,
    pub hotkey_enabled: Option<bool>,
    #[allow(dead_code)]
    pub cleanup_enabled: Option<bool>,
    pub selected_device: Option<Option<String>>,
    pub selected_mode: Option<String>,
    pub history: Vec<TranscriptRecord>,
    pub initial_history: Vec<TranscriptRecord>,
}

impl SettingsStore for MemoryStore {
    fn save_binding(&mut self, binding: &HotkeyBinding) -> AppResult<()> {
        self.saves.push("binding".to_string());
        self.binding = Some(binding.clone());
        Ok(())
    }

    fn save_hotkey_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.saves.push("hotkey_enabled".to_string());
        self.hotkey_enabled = Some(enabled);
        Ok(())
    }

    fn save_cleanup_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.saves.push("cleanup_enabled".to_string());
        self.cleanup_enabled = Some(enabled);
        Ok(())
    }

    fn save_selected_device(&mut self, device_id: Option<&str>) -> AppResult<()> {
        self.saves.push("selected_device".to_string());
        self.selected_device = Some(device_id.map(str::to_string));
        Ok(())
    }

    fn save_selected_mode(&mut self, mode_id: &str) -> AppResult<()> {
        self.saves.push("selected_mode".to_string());
        self.selected_mode = Some(mode_id.to_string());
        Ok(())
    }

    fn save_history(&mut self, records: &[TranscriptRecord]) -> AppResult<()> {
        self.saves.push("history".to_string());
        self.history = records.to_vec();
        Ok(())
    }

    fn load_history(&self) -> AppResult<Vec<TranscriptRecord>> {
        Ok(self.initial_history.clone())
    }
}

pub(crate) struct MockRegistrar {
    pub log: Log,
}

impl HotkeyRegistrar for MockRegistrar {
    fn register(&mut self, binding: &HotkeyBinding) -> AppResult<()> {
        log_push(&self.log, format!("register:{}", binding.display()));
        Ok(())
    }

    fn unregister_all(&mut self) -> AppResult<()> {
        log_push(&self.log, "unregister_all");
        Ok(())
    }
}

/// Knobs for a session-machine fixture.
pub(crate) struct FixtureConfig {
    pub model_loaded: bool,
    pub samples: Vec<f32>,
    pub text: String,
    pub language: String,
    pub stt_fail: bool,
    pub audio_fail_start: bool,
    pub audio_fail_stop: bool,
    pub cleanup_enabled: bool,
    pub cleanup_reply: Result<String, String>,
    pub fail_copy: bool,
    pub fail_hide: bool,
    pub initial_history: Vec<TranscriptRecord>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            model_loaded: true,
            samples: vec![0.2; 1600],
            text: "buy milk and eggs".to_string(),
            language: "en".to_string(),
            stt_fail: false,
            audio_fail_start: false,
            audio_fail_stop: false,
            cleanup_enabled: false,
            cleanup_reply: Ok("cleaned".to_string()),
            fail_copy: false,
            fail_hide: false,
            initial_history: Vec::new(),
        }
    }
}

pub(crate) type TestMachine =
    SessionStateMachine<MockAudio, MockStt, MockCleanup, MockOverlay, MockDelivery, MemoryStore>;

pub(crate) struct Fixture {
    pub machine: TestMachine,
    pub audio_log: Log,
    pub overlay_log: Log,
    pub delivery_log: Log,
    pub cleanup_calls: Log,
    pub clipboard: Arc<Mutex<Option<String>>>,
    pub pastes: Arc<AtomicUsize>,
    pub store: Arc<Mutex<MemoryStore>>,
}

pub(crate) fn fixture(config: FixtureConfig) -> Fixture {
    let audio_log = new_log();
    let overlay_log = new_log();
    let delivery_log = new_log();
    let cleanup_calls = new_log();
    let clipboard = Arc::new(Mutex::new(None));
    let pastes = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(Mutex::new(MemoryStore {
        initial_history: config.initial_history,
        ..MemoryStore::default()
    }));

    let audio = Arc::new(AsyncMutex::new(MockAudio {
        log: Arc::clone(&audio_log),
        samples: config.samples,
        fail_start: config.audio_fail_start,
        fail_stop: config.audio_fail_stop,
        devices: Vec::new(),
    }));
    let stt = Arc::new(AsyncMutex::new(MockStt {
        loaded: config.model_loaded,
        text: config.text,
        language: config.language,
        fail: config.stt_fail,
    }));
    let cleanup = Arc::new(AsyncMutex::new(MockCleanup {
        available: true,
        enabled: config.cleanup_enabled,
        reply: config.cleanup_reply,
        calls: Arc::clone(&cleanup_calls),
    }));
    let overlay = OverlayCoordinator::new(MockOverlay {
        log: Arc::clone(&overlay_log),
        fail_hide: config.fail_hide,
    });
    let delivery = Arc::new(AsyncMutex::new(MockDelivery {
        log: Arc::clone(&delivery_log),
        clipboard: Arc::clone(&clipboard),
        pastes: Arc::clone(&pastes),
        fail_copy: config.fail_copy,
    }));
    let history = Arc::new(AsyncMutex::new(HistoryStore::new(Arc::clone(&store))));

    let machine = SessionStateMachine::new(audio, stt, cleanup, overlay, delivery, history, None);

    Fixture {
        machine,
        audio_log,
        overlay_log,
        delivery_log,
        cleanup_calls,
        clipboard,
        pastes,
        store,
    }
}

/// Poll until `predicate` holds, with a generous timeout.
pub(crate) async fn wait_until(predicate: impl Fn() -> bool) -> bool {
    for _ in 0..300 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
