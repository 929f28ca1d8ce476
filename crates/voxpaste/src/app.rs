use crate::{
    AppCommand, AppResult, DeviceSelector, HistoryStore, HotkeyCaptureEngine, ModeRegistry,
    OllamaCleanup, OutputHandler, SessionPhase, SessionStateMachine, TrayIconState, TrayOverlay,
    TriggerSource, UiCommand,
    hotkey_listener::HotkeyRebinder,
    platform::{SettingsStore, TextCleanup, TextDelivery},
    store::{ConfigStore, lock_unpoisoned},
    tray_manager::transcript_label,
};

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use tao::event_loop::EventLoopProxy;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::{
    MouseButton, MouseButtonState, TrayIconEvent,
    menu::MenuEvent,
};
use voxpaste_core::AudioManager;

/// The orchestrator instantiated with the shipped collaborators. The
/// audio manager serves both the capture and speech-to-text contracts.
pub(crate) type Machine =
    SessionStateMachine<AudioManager, AudioManager, OllamaCleanup, TrayOverlay, OutputHandler, ConfigStore>;
pub(crate) type Registry = ModeRegistry<OllamaCleanup, TrayOverlay, ConfigStore>;
pub(crate) type Selector = DeviceSelector<AudioManager, ConfigStore>;
pub(crate) type Capture = HotkeyCaptureEngine<HotkeyRebinder, ConfigStore>;

/// Main application state.
///
/// Runs on the async runtime thread. All tray/hotkey mutations flow back
/// to the main thread through `ui_proxy` because `TrayIcon` and the
/// hotkey manager must live there.
pub struct App {
    pub(crate) machine: Machine,
    pub(crate) registry: Registry,
    pub(crate) selector: Selector,
    pub(crate) capture: Capture,
    pub(crate) cleanup: Arc<Mutex<OllamaCleanup>>,
    pub(crate) delivery: Arc<Mutex<OutputHandler>>,
    pub(crate) history: Arc<Mutex<HistoryStore<ConfigStore>>>,
    pub(crate) store: Arc<StdMutex<ConfigStore>>,
    pub(crate) ui_proxy: EventLoopProxy<UiCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("VoxPaste starting");

        self.startup().await;

        // Tray menu and tray icon events arrive on global crossbeam
        // channels with blocking recv() -- one persistent forwarder task
        // each, zero polling. When the mpsc receiver is dropped, the next
        // blocking_send() fails and the forwarder exits.
        let (menu_tx, mut menu_rx) = mpsc::channel(32);
        let menu_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if menu_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let (tray_tx, mut tray_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = TrayIconEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = menu_rx.recv() => {
                    if self.handle_menu_event(event).await? {
                        break;
                    }
                }

                Some(event) = tray_rx.recv() => {
                    self.handle_tray_event(event).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::TriggerPressed { source } => {
                            debug!(?source, "Trigger pressed");
                            self.machine.start().await;
                            self.notify_start_failure();
                        }
                        AppCommand::TriggerReleased { source } => {
                            debug!(?source, "Trigger released");
                            let was_recording =
                                self.machine.handle().phase() == SessionPhase::Recording;
                            self.machine.stop().await;
                            if was_recording {
                                self.watch_pipeline_outcome();
                            }
                        }
                        AppCommand::CaptureKey(raw) => {
                            if let Some(binding) = self.capture.on_raw_key_event(&raw) {
                                self.send_ui(UiCommand::EndCapture);
                                self.send_ui(UiCommand::SetHotkeyLabel(binding.display()));
                            }
                        }
                        AppCommand::CaptureCancelled => {
                            self.capture.cancel_capture();
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(menu_rx);
        drop(tray_rx);

        for (name, handle) in [("menu", menu_handle), ("tray", tray_handle)] {
            match tokio::time::timeout(std::time::Duration::from_secs(1), handle).await {
                Ok(Ok(())) => debug!(forwarder = name, "Event forwarder stopped cleanly"),
                Ok(Err(e)) => error!(forwarder = name, error = ?e, "Event forwarder panicked"),
                Err(_) => debug!(
                    forwarder = name,
                    "Event forwarder did not stop within timeout, cleaned up on exit"
                ),
            }
        }

        let _ = self.shutdown_tx.send(true);
        info!("VoxPaste shut down");

        Ok(())
    }

    /// One-time startup: restore the persisted device, seed the tray's
    /// microphone list and recent transcripts, surface the most recent
    /// result in the tooltip.
    async fn startup(&self) {
        let persisted_device = {
            let store = lock_unpoisoned(&self.store);
            store.config().audio.selected_device.clone()
        };
        self.selector.restore(persisted_device.as_deref()).await;

        let devices = self.selector.list_devices().await;
        let active = persisted_device
            .filter(|id| devices.iter().any(|d| d.id.as_deref() == Some(id.as_str())));
        self.send_ui(UiCommand::SetDevices {
            devices: std::iter::once((None, "System Default".to_string()))
                .chain(devices.into_iter().map(|d| (d.id, d.name)))
                .collect(),
            active,
        });

        info!(
            binding = %self.capture.binding().display(),
            enabled = self.capture.is_enabled(),
            "Global hotkey configured"
        );

        self.machine.rehydrate().await;
        if let Some(record) = self.machine.handle().last_result() {
            self.send_ui(UiCommand::SetTray {
                state: TrayIconState::Idle,
                tooltip: format!("VoxPaste - Ready \u{00b7} Last: {}",
                    transcript_label(record.final_text())),
            });
        }

        let recent: Vec<String> = {
            let history = self.history.lock().await;
            history
                .entries()
                .iter()
                .take(3)
                .map(|r| r.final_text().to_string())
                .collect()
        };
        if !recent.is_empty() {
            self.send_ui(UiCommand::SeedTranscripts(recent));
        }
    }

    /// `start()` never errors to its caller; a refusal (no model, capture
    /// failure) lands in the error slot with the phase still Idle. Show it.
    fn notify_start_failure(&self) {
        let handle = self.machine.handle();
        if matches!(handle.phase(), SessionPhase::Idle | SessionPhase::Ready) {
            if let Some(message) = handle.last_error() {
                post_error_notification(&message);
            }
        }
    }

    /// Follow a released trigger's pipeline to its end: a failure becomes
    /// an OS notification, a success refreshes the menu's stats line.
    fn watch_pipeline_outcome(&self) {
        let machine = self.machine.clone();
        let ui_proxy = self.ui_proxy.clone();
        tokio::spawn(async move {
            let handle = machine.handle();
            loop {
                match handle.phase() {
                    SessionPhase::Ready => {
                        let _ = ui_proxy.send_event(UiCommand::SetStats(machine.statistics()));
                        return;
                    }
                    // A newer session took over; its own watcher reports.
                    SessionPhase::Recording => return,
                    SessionPhase::Idle => break,
                    SessionPhase::Transcribing | SessionPhase::Cleaning => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
            if let Some(message) = handle.last_error() {
                post_error_notification(&message);
            }
        });
    }

    /// Handle a tray menu click. Returns `true` on quit.
    #[instrument(skip(self, event))]
    async fn handle_menu_event(&mut self, event: MenuEvent) -> AppResult<bool> {
        let id: &str = event.id.as_ref();

        if let Some(index) = id.strip_prefix("transcript:") {
            if let Ok(index) = index.parse::<usize>() {
                let text = {
                    let history = self.history.lock().await;
                    history.entries().get(index).map(|r| r.final_text().to_string())
                };
                if let Some(text) = text {
                    if let Err(e) = self.delivery.lock().await.copy_to_clipboard(&text) {
                        warn!(error = ?e, "Failed to copy transcript from menu");
                    }
                }
            }
            return Ok(false);
        }

        if let Some(device) = id.strip_prefix("device:") {
            let selection = (device != "default").then(|| device.to_string());
            match self.selector.select_device(selection.as_deref()).await {
                Ok(()) => self.send_ui(UiCommand::SetActiveDevice(selection)),
                Err(e) => {
                    warn!(error = ?e, "Failed to switch input device");
                    // Put the checkmark back on the device actually in use.
                    let current = {
                        let store = lock_unpoisoned(&self.store);
                        store.config().audio.selected_device.clone()
                    };
                    self.send_ui(UiCommand::SetActiveDevice(current));
                }
            }
            return Ok(false);
        }

        if let Some(mode_id) = id.strip_prefix("mode:") {
            let mode_id = mode_id.to_string();
            self.registry.select_mode(&mode_id).await;
            // Reassert the real selection: a rejected click still flipped
            // the checkmark on the UI side.
            self.send_ui(UiCommand::SetActiveMode(self.registry.active_mode_id()));
            return Ok(false);
        }

        match id {
            "toggle_cleanup" => {
                let enabled = {
                    let mut cleanup = self.cleanup.lock().await;
                    let enabled = !cleanup.is_enabled();
                    cleanup.set_enabled(enabled);
                    enabled
                };
                if let Err(e) = lock_unpoisoned(&self.store).save_cleanup_enabled(enabled) {
                    warn!(error = ?e, "Failed to persist cleanup toggle");
                }
                info!(enabled, "Cleanup toggled");
                self.send_ui(UiCommand::SetCleanupEnabled(enabled));
            }
            "toggle_hotkey" => {
                let enabled = !self.capture.is_enabled();
                self.capture.set_enabled(enabled);
                self.send_ui(UiCommand::SetHotkeyEnabled(self.capture.is_enabled()));
            }
            "capture_hotkey" => {
                if !self.capture.is_capturing() {
                    self.capture.begin_capture();
                    self.send_ui(UiCommand::BeginCapture);
                }
            }
            "open_config" => {
                if let Ok(dir) = crate::config::Config::config_dir() {
                    let _ = open::that(dir);
                    info!("Opened config folder");
                }
            }
            "quit" => {
                info!("Exit requested from tray menu");
                self.send_ui(UiCommand::Shutdown);
                return Ok(true);
            }
            _ => {}
        }

        Ok(false)
    }

    /// Press-and-hold on the tray icon is the pointer gesture trigger:
    /// left button down starts the session, up stops it.
    async fn handle_tray_event(&self, event: TrayIconEvent) {
        if let TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state,
            ..
        } = event
        {
            match button_state {
                MouseButtonState::Down => {
                    debug!(source = ?TriggerSource::Gesture, "Trigger pressed");
                    self.machine.start().await;
                    self.notify_start_failure();
                }
                MouseButtonState::Up => {
                    debug!(source = ?TriggerSource::Gesture, "Trigger released");
                    let was_recording =
                        self.machine.handle().phase() == SessionPhase::Recording;
                    self.machine.stop().await;
                    if was_recording {
                        self.watch_pipeline_outcome();
                    }
                }
            }
        }
    }

    fn send_ui(&self, command: UiCommand) {
        if let Err(e) = self.ui_proxy.send_event(command) {
            warn!(error = %e, "UI thread unreachable");
        }
    }
}

/// Session failures are delivered as OS notifications; the overlay is
/// already hidden by the time the error slot is readable.
fn post_error_notification(message: &str) {
    if let Err(e) = notify_rust::Notification::new()
        .summary("VoxPaste")
        .body(message)
        .show()
    {
        warn!(error = %e, "Failed to post error notification");
    }
}
