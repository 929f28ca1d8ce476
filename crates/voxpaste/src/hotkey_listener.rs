//! Global hotkey integration: binding conversion, registration helpers,
//! and the press/release event loop.
//!
//! Registration happens on the main thread, where tao's event loop pumps
//! the Windows messages needed for WM_HOTKEY delivery; this listener runs
//! on the async runtime and only consumes the event channel.

use crate::{
    AppCommand, AppError, AppResult, HotkeyBinding, ModifierKey, TriggerSource, UiCommand,
    platform::HotkeyRegistrar,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Convert a canonical binding into a `global-hotkey` registration value.
pub fn binding_to_hotkey(binding: &HotkeyBinding) -> AppResult<HotKey> {
    let code = parse_key_code(&binding.primary_key).ok_or_else(|| {
        AppError::HotkeyRegistrationFailed {
            reason: format!("Unknown key: {}", binding.primary_key),
            location: ErrorLocation::from(Location::caller()),
        }
    })?;

    let mut mods = Modifiers::empty();
    for modifier in &binding.modifiers {
        mods |= match modifier {
            ModifierKey::Meta => Modifiers::META,
            ModifierKey::Shift => Modifiers::SHIFT,
            ModifierKey::Alt => Modifiers::ALT,
            ModifierKey::Control => Modifiers::CONTROL,
        };
    }

    let mods = if mods.is_empty() { None } else { Some(mods) };

    Ok(HotKey::new(mods, code))
}

/// Register `binding` with the manager, returning the registered hotkey.
///
/// Must be called on the main thread; the manager must stay alive there
/// for the registration to persist.
#[track_caller]
#[instrument(skip(manager))]
pub fn register_binding(
    manager: &GlobalHotKeyManager,
    binding: &HotkeyBinding,
) -> AppResult<HotKey> {
    let hotkey = binding_to_hotkey(binding)?;

    manager
        .register(hotkey)
        .map_err(|e| AppError::HotkeyRegistrationFailed {
            reason: format!("Failed to register {}: {}", binding.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!(binding = %binding.display(), "Global hotkey registered");

    Ok(hotkey)
}

/// Registrar handed to the capture engine on the async side. Registration
/// itself must happen on the main thread, so this only forwards commands
/// through the event-loop proxy.
pub struct HotkeyRebinder {
    ui_proxy: EventLoopProxy<UiCommand>,
}

impl HotkeyRebinder {
    pub fn new(ui_proxy: EventLoopProxy<UiCommand>) -> Self {
        Self { ui_proxy }
    }

    fn send(&self, command: UiCommand) -> AppResult<()> {
        self.ui_proxy
            .send_event(command)
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send hotkey command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl HotkeyRegistrar for HotkeyRebinder {
    fn register(&mut self, binding: &HotkeyBinding) -> AppResult<()> {
        self.send(UiCommand::Rebind(binding.clone()))
    }

    fn unregister_all(&mut self) -> AppResult<()> {
        self.send(UiCommand::UnregisterHotkeys)
    }
}

/// Consumes global hotkey press/release events and forwards them as
/// trigger commands.
pub struct HotkeyListener {
    active_id: Arc<AtomicU32>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyListener {
    /// `active_id` holds the id of the currently registered hotkey (0 when
    /// none); the main thread updates it on every rebind so this listener
    /// always filters against the live registration.
    pub fn new(active_id: Arc<AtomicU32>, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            active_id,
            command_tx,
        }
    }

    /// Run the hotkey event loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // Single persistent blocking task that forwards hotkey events.
        // The crossbeam receiver has blocking recv() -- zero polling,
        // instant response, one thread. When event_rx is dropped, the next
        // blocking_send() fails and the task exits.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey listener shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    self.handle_event(event).await?;
                }
            }
        }

        // Drop event_rx to unblock the blocking task's next blocking_send().
        drop(event_rx);

        // Best-effort join: the blocking task may be stuck in recv() if no
        // hotkey event arrives after shutdown.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    async fn handle_event(&self, event: GlobalHotKeyEvent) -> AppResult<()> {
        let active = self.active_id.load(Ordering::Acquire);
        if active == 0 || event.id != active {
            return Ok(());
        }

        let command = match event.state {
            HotKeyState::Pressed => AppCommand::TriggerPressed {
                source: TriggerSource::Hotkey,
            },
            HotKeyState::Released => AppCommand::TriggerReleased {
                source: TriggerSource::Hotkey,
            },
        };

        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to forward hotkey trigger: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Map a canonical primary-key token onto a `global-hotkey` key code.
fn parse_key_code(token: &str) -> Option<Code> {
    let code = match token {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "Space" => Code::Space,
        "Enter" => Code::Enter,
        "Escape" => Code::Escape,
        "Backspace" => Code::Backspace,
        "Tab" => Code::Tab,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "MetaLeft" => Code::MetaLeft,
        "MetaRight" => Code::MetaRight,
        "ShiftLeft" => Code::ShiftLeft,
        "ShiftRight" => Code::ShiftRight,
        "AltLeft" => Code::AltLeft,
        "AltRight" => Code::AltRight,
        "ControlLeft" => Code::ControlLeft,
        "ControlRight" => Code::ControlRight,
        "-" => Code::Minus,
        "=" => Code::Equal,
        "," => Code::Comma,
        "." => Code::Period,
        "/" => Code::Slash,
        ";" => Code::Semicolon,
        "'" => Code::Quote,
        "[" => Code::BracketLeft,
        "]" => Code::BracketRight,
        "`" => Code::Backquote,
        "\\" => Code::Backslash,
        _ => return None,
    };
    Some(code)
}
