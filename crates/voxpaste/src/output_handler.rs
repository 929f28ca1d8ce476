//! Clipboard delivery, recent-transcript surfacing, and paste simulation.

use crate::{AppError, AppResult, PasteKeyGuard, UiCommand, platform::TextDelivery};

use std::panic::Location;
use std::time::Duration;

use arboard::Clipboard;
use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tracing::{debug, info, instrument, warn};

/// Delay between key events in the paste simulation.
///
/// Some applications and input method editors need a small gap between
/// key_down, key_click, and key_up to register events correctly. 10ms is
/// the minimum reliable interval.
const KEY_EVENT_DELAY: Duration = Duration::from_millis(10);

/// Output handler for clipboard, notifications, and auto-paste.
pub struct OutputHandler {
    pub(crate) clipboard: Clipboard,
    ui_proxy: EventLoopProxy<UiCommand>,
}

impl OutputHandler {
    /// Create a new output handler.
    #[track_caller]
    #[instrument(skip(ui_proxy))]
    pub fn new(ui_proxy: EventLoopProxy<UiCommand>) -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("OutputHandler initialized");

        Ok(Self {
            clipboard,
            ui_proxy,
        })
    }
}

impl TextDelivery for OutputHandler {
    #[instrument(skip(self, text))]
    fn copy_to_clipboard(&mut self, text: &str) -> AppResult<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| AppError::ClipboardError {
                reason: format!("Failed to set clipboard: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(text_len = text.len(), "Text copied to clipboard");

        Ok(())
    }

    #[instrument(skip(self, text))]
    fn notify_recent_transcript(&mut self, text: &str) -> AppResult<()> {
        self.ui_proxy
            .send_event(UiCommand::PushTranscript(text.to_string()))
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send transcript to tray: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        // The OS notification is a convenience on top of the tray entry;
        // a missing notification daemon must not fail the pipeline.
        if let Err(e) = notify_rust::Notification::new()
            .summary("VoxPaste")
            .body(text)
            .show()
        {
            warn!(error = %e, "Failed to post transcript notification");
        }

        Ok(())
    }

    #[instrument(skip(self))]
    fn simulate_paste(&mut self) -> AppResult<()> {
        use enigo::{Direction, Key, Keyboard};

        // A fresh Enigo per paste: Enigo is not Send, so it cannot live in
        // this handler, and Enigo::new() is cheap.
        //
        // RAII: PasteKeyGuard releases the modifier on drop even if the V
        // press fails, so a failure can never leave the modifier stuck.
        let mut guard = PasteKeyGuard::new()?;

        std::thread::sleep(KEY_EVENT_DELAY);

        guard
            .enigo_mut()
            .key(Key::Unicode('v'), Direction::Click)
            .map_err(|e| AppError::AutoPasteFailed {
                reason: format!("Failed to press V: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        std::thread::sleep(KEY_EVENT_DELAY);

        // Guard drops here, releasing the modifier.
        debug!("Auto-paste simulated");

        Ok(())
    }
}
