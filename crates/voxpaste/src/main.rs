//! VoxPaste: push-to-talk dictation with clipboard delivery and auto-paste.
//!
//! Hold the tray icon or the global hotkey, speak, release. The transcript
//! is cleaned up by a local model when available, copied to the clipboard,
//! and pasted into the focused window.

mod app;
mod app_command;
mod cleanup;
mod config;
mod devices;
mod error;
mod history;
mod hotkey_binding;
mod hotkey_capture;
mod hotkey_listener;
mod keycap;
mod modes;
mod output_handler;
mod overlay;
mod paste_key_guard;
mod platform;
mod session;
mod store;
#[cfg(test)]
mod tests;
mod transcript;
mod tray_icon_state;
mod tray_manager;
mod tray_overlay;
mod ui_command;

pub(crate) use {
    app::App,
    app_command::{AppCommand, TriggerSource},
    cleanup::OllamaCleanup,
    devices::DeviceSelector,
    error::{AppError, Result as AppResult},
    history::HistoryStore,
    hotkey_binding::{HotkeyBinding, ModifierKey},
    hotkey_capture::HotkeyCaptureEngine,
    hotkey_listener::HotkeyListener,
    modes::ModeRegistry,
    output_handler::OutputHandler,
    overlay::{OverlayCoordinator, OverlayState},
    paste_key_guard::PasteKeyGuard,
    session::{SessionPhase, SessionStateMachine},
    transcript::{SessionStatistics, TranscriptRecord},
    tray_icon_state::TrayIconState,
    tray_manager::{TrayManager, TrayMenuModel},
    tray_overlay::TrayOverlay,
    ui_command::UiCommand,
};

use crate::{
    config::Config,
    hotkey_listener::{HotkeyRebinder, register_binding},
    store::{ConfigStore, lock_unpoisoned},
};

use std::sync::{
    Arc, Mutex as StdMutex,
    atomic::{AtomicU32, Ordering},
};

use global_hotkey::{GlobalHotKeyManager, hotkey::HotKey};
use tao::{
    dpi::LogicalSize,
    event::{ElementState, Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    keyboard::ModifiersState,
    window::{Window, WindowBuilder},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, warn};

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("voxpaste=debug")
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let event_loop = EventLoopBuilder::<UiCommand>::with_user_event().build();
    let ui_proxy = event_loop.create_proxy();

    let catalog = modes::builtin_modes();

    // TrayManager lives on the main thread - TrayIcon is !Send on all
    // platforms. The tray doubles as the session overlay and the gesture
    // trigger surface.
    let mut tray_manager = match TrayManager::new(TrayMenuModel {
        transcripts: Vec::new(),
        stats: None,
        modes: catalog
            .iter()
            .map(|m| (m.id.to_string(), m.display_name.to_string()))
            .collect(),
        active_mode: config.mode.selected.clone(),
        devices: vec![(None, "System Default".to_string())],
        active_device: config.audio.selected_device.clone(),
        cleanup_enabled: config.cleanup.enabled,
        hotkey_enabled: config.hotkey.enabled,
        hotkey_label: config.hotkey.binding.display(),
    }) {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations -- dropping it unregisters
    // the hotkey. Registration must happen on this thread: tao's event
    // loop pumps the messages needed for WM_HOTKEY delivery on Windows.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;
    let mut registered_hotkey: Option<HotKey> = None;
    let active_hotkey_id = Arc::new(AtomicU32::new(0));

    // Hotkey capture window state; present only while capturing.
    let mut capture_window: Option<Window> = None;
    let mut capture_mods = ModifiersState::default();
    let mut capture_tx: Option<mpsc::Sender<AppCommand>> = None;

    let mut boot_config = Some(config);

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    UiCommand::SetTray { state, tooltip } => {
                        if let Err(e) = tray_manager.update_state(state, &tooltip) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    UiCommand::PushTranscript(text) => {
                        if let Err(e) = tray_manager.push_transcript(text) {
                            error!(error = ?e, "Failed to update tray transcripts");
                        }
                    }
                    UiCommand::SeedTranscripts(transcripts) => {
                        if let Err(e) = tray_manager.seed_transcripts(transcripts) {
                            error!(error = ?e, "Failed to seed tray transcripts");
                        }
                    }
                    UiCommand::SetActiveMode(mode_id) => {
                        if let Err(e) = tray_manager.set_active_mode(mode_id) {
                            error!(error = ?e, "Failed to update mode checkmarks");
                        }
                    }
                    UiCommand::SetDevices { devices, active } => {
                        if let Err(e) = tray_manager.set_devices(devices, active) {
                            error!(error = ?e, "Failed to update microphone list");
                        }
                    }
                    UiCommand::SetActiveDevice(device_id) => {
                        if let Err(e) = tray_manager.set_active_device(device_id) {
                            error!(error = ?e, "Failed to update microphone checkmark");
                        }
                    }
                    UiCommand::SetStats(stats) => {
                        if let Err(e) = tray_manager.set_stats(stats) {
                            error!(error = ?e, "Failed to update statistics line");
                        }
                    }
                    UiCommand::SetCleanupEnabled(enabled) => {
                        if let Err(e) = tray_manager.set_cleanup_enabled(enabled) {
                            error!(error = ?e, "Failed to update cleanup toggle");
                        }
                    }
                    UiCommand::SetHotkeyEnabled(enabled) => {
                        if let Err(e) = tray_manager.set_hotkey_enabled(enabled) {
                            error!(error = ?e, "Failed to update hotkey toggle");
                        }
                    }
                    UiCommand::SetHotkeyLabel(label) => {
                        if let Err(e) = tray_manager.set_hotkey_label(label) {
                            error!(error = ?e, "Failed to update hotkey label");
                        }
                    }
                    UiCommand::Rebind(binding) => {
                        if let Some(manager) = &hotkey_manager {
                            if let Some(previous) = registered_hotkey.take() {
                                let _ = manager.unregister(previous);
                                active_hotkey_id.store(0, Ordering::Release);
                            }
                            match register_binding(manager, &binding) {
                                Ok(hotkey) => {
                                    active_hotkey_id.store(hotkey.id(), Ordering::Release);
                                    registered_hotkey = Some(hotkey);
                                }
                                Err(e) => error!(error = ?e, "Failed to register hotkey"),
                            }
                        }
                    }
                    UiCommand::UnregisterHotkeys => {
                        if let (Some(manager), Some(previous)) =
                            (&hotkey_manager, registered_hotkey.take())
                        {
                            let _ = manager.unregister(previous);
                        }
                        active_hotkey_id.store(0, Ordering::Release);
                        info!("Global hotkey unregistered");
                    }
                    UiCommand::BeginCapture => {
                        if capture_window.is_none() {
                            capture_mods = ModifiersState::default();
                            match WindowBuilder::new()
                                .with_title("VoxPaste - press the new hotkey")
                                .with_inner_size(LogicalSize::new(360.0, 120.0))
                                .with_resizable(false)
                                .with_always_on_top(true)
                                .build(target)
                            {
                                Ok(window) => capture_window = Some(window),
                                Err(e) => error!(error = %e, "Failed to open capture window"),
                            }
                        }
                    }
                    UiCommand::EndCapture => {
                        capture_window = None;
                    }
                    UiCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(StartCause::Init) => {
                let Some(config) = boot_config.take() else {
                    return;
                };

                let audio = match voxpaste_core::AudioManager::new() {
                    Ok(am) => Arc::new(Mutex::new(am)),
                    Err(e) => {
                        error!("Failed to create AudioManager: {:?}", e);
                        std::process::exit(1);
                    }
                };

                // The model loads lazily: a missing file only surfaces
                // when recording is attempted.
                if config.model_present() {
                    if let Err(e) = {
                        let mut guard = audio.blocking_lock();
                        guard.load_model(&config.whisper.model_path, config.whisper.use_gpu)
                    } {
                        warn!(error = ?e, "Failed to load Whisper model at startup");
                    }
                } else {
                    warn!(
                        model_path = ?config.whisper.model_path,
                        "Whisper model not found; recording disabled until it is downloaded"
                    );
                }

                let store = match ConfigStore::new(config.clone()) {
                    Ok(s) => Arc::new(StdMutex::new(s)),
                    Err(e) => {
                        error!("Failed to create settings store: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let delivery = match OutputHandler::new(ui_proxy.clone()) {
                    Ok(oh) => Arc::new(Mutex::new(oh)),
                    Err(e) => {
                        error!("Failed to create OutputHandler: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let cleanup = Arc::new(Mutex::new(OllamaCleanup::new(
                    config.cleanup.endpoint.clone(),
                    config.cleanup.model.clone(),
                    config.cleanup.enabled,
                )));

                let history = Arc::new(Mutex::new(HistoryStore::new(Arc::clone(&store))));

                let catalog = modes::builtin_modes();
                let overlay = OverlayCoordinator::new(TrayOverlay::new(ui_proxy.clone(), &catalog));

                let machine = SessionStateMachine::new(
                    Arc::clone(&audio),
                    Arc::clone(&audio),
                    Arc::clone(&cleanup),
                    overlay.clone(),
                    Arc::clone(&delivery),
                    Arc::clone(&history),
                    Some(config.mode.selected.clone()),
                );

                let registry = ModeRegistry::new(
                    catalog,
                    &config.mode.selected,
                    Arc::clone(&cleanup),
                    overlay.clone(),
                    machine.handle(),
                    Arc::clone(&store),
                );

                let selector = DeviceSelector::new(Arc::clone(&audio), Arc::clone(&store));

                let capture = HotkeyCaptureEngine::new(
                    config.hotkey.binding.clone(),
                    config.hotkey.enabled,
                    HotkeyRebinder::new(ui_proxy.clone()),
                    Arc::clone(&store),
                );

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                capture_tx = Some(command_tx.clone());

                match GlobalHotKeyManager::new() {
                    Ok(manager) => {
                        if config.hotkey.enabled {
                            match register_binding(&manager, &config.hotkey.binding) {
                                Ok(hotkey) => {
                                    active_hotkey_id.store(hotkey.id(), Ordering::Release);
                                    registered_hotkey = Some(hotkey);
                                }
                                Err(e) => error!(error = ?e, "Failed to register hotkey"),
                            }
                        }
                        hotkey_manager = Some(manager);
                    }
                    Err(e) => error!(error = %e, "Failed to create hotkey manager"),
                }

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let listener_id = Arc::clone(&active_hotkey_id);
                let ui_proxy = ui_proxy.clone();

                // Spawn tokio runtime on a separate thread. TrayManager,
                // the hotkey manager, and the capture window stay here.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let listener = HotkeyListener::new(listener_id, command_tx);

                        let app = App {
                            machine,
                            registry,
                            selector,
                            capture,
                            cleanup,
                            delivery,
                            history,
                            store,
                            ui_proxy,
                            command_rx,
                            shutdown_tx,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = listener.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey listener error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            Event::LoopDestroyed => {
                // OS-driven teardown (logout, session end): tell the
                // runtime thread to wind down its loops.
                if let Some(tx) = &capture_tx {
                    let _ = tx.blocking_send(AppCommand::Shutdown);
                }
            }
            Event::WindowEvent {
                window_id, event, ..
            } => {
                let Some(window) = capture_window.as_ref() else {
                    return;
                };
                if window.id() != window_id {
                    return;
                }

                match event {
                    WindowEvent::ModifiersChanged(mods) => {
                        capture_mods = mods;
                    }
                    WindowEvent::KeyboardInput {
                        event: key_event, ..
                    } => {
                        if key_event.state == ElementState::Pressed {
                            let raw = keycap::raw_key_event(&key_event, capture_mods);
                            if let Some(tx) = &capture_tx {
                                let _ = tx.blocking_send(AppCommand::CaptureKey(raw));
                            }
                        }
                    }
                    WindowEvent::CloseRequested => {
                        capture_window = None;
                        if let Some(tx) = &capture_tx {
                            let _ = tx.blocking_send(AppCommand::CaptureCancelled);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}
