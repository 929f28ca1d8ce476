use crate::{HotkeyBinding, SessionStatistics, TrayIconState};

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns the tray (`TrayIcon` is `!Send`), the
/// `GlobalHotKeyManager` (registration needs the main thread's message
/// pump), and the hotkey capture window, so all mutations of those flow
/// through this enum via the tao event-loop proxy.
#[derive(Debug, Clone)]
pub enum UiCommand {
    /// Update the tray icon and tooltip.
    SetTray {
        /// New icon state.
        state: TrayIconState,
        /// New tooltip text.
        tooltip: String,
    },
    /// Prepend a transcript to the tray's recent list.
    PushTranscript(String),
    /// Replace the tray's recent list wholesale (startup rehydration).
    SeedTranscripts(Vec<String>),
    /// Replace the microphone submenu's device list and checkmark.
    SetDevices {
        /// (selection id, label) pairs; `None` is the system default.
        devices: Vec<(Option<String>, String)>,
        /// Currently selected device id.
        active: Option<String>,
    },
    /// Move the microphone checkmark.
    SetActiveDevice(Option<String>),
    /// Refresh the statistics line in the menu.
    SetStats(SessionStatistics),
    /// Show the current binding in the capture menu entry.
    SetHotkeyLabel(String),
    /// Reflect the active mode in the menu checkmarks.
    SetActiveMode(String),
    /// Reflect the cleanup toggle in the menu.
    SetCleanupEnabled(bool),
    /// Reflect the hotkey toggle in the menu.
    SetHotkeyEnabled(bool),
    /// Replace the registered global hotkey.
    Rebind(HotkeyBinding),
    /// Drop the registered global hotkey.
    UnregisterHotkeys,
    /// Open the hotkey capture window.
    BeginCapture,
    /// Close the hotkey capture window.
    EndCapture,
    /// Shut down the application; the main thread exits the event loop.
    Shutdown,
}
