//! Overlay surface rendered onto the tray icon and tooltip.
//!
//! The session overlay contract (`show`/`set_state`/`set_mode`/`hide`) is
//! fulfilled by repainting the tray icon and tooltip on the main thread;
//! this type runs on the async side and only sends [`UiCommand`]s.

use crate::{
    AppError, AppResult, OverlayState, TrayIconState, UiCommand, modes::ModeDescriptor,
    platform::OverlaySurface,
};

use std::{collections::HashMap, panic::Location};

use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tracing::debug;

pub struct TrayOverlay {
    ui_proxy: EventLoopProxy<UiCommand>,
    mode_names: HashMap<String, String>,
    mode_label: String,
    visible_state: Option<OverlayState>,
}

impl TrayOverlay {
    pub fn new(ui_proxy: EventLoopProxy<UiCommand>, catalog: &[ModeDescriptor]) -> Self {
        let mode_names = catalog
            .iter()
            .map(|m| (m.id.to_string(), m.display_name.to_string()))
            .collect();
        Self {
            ui_proxy,
            mode_names,
            mode_label: String::new(),
            visible_state: None,
        }
    }

    fn mode_label_for(&self, mode_id: &str) -> String {
        self.mode_names
            .get(mode_id)
            .cloned()
            .unwrap_or_else(|| mode_id.to_string())
    }

    fn send(&self, state: TrayIconState, tooltip: String) -> AppResult<()> {
        self.ui_proxy
            .send_event(UiCommand::SetTray { state, tooltip })
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send tray update: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn render(&self, state: OverlayState) -> AppResult<()> {
        debug!(state = state.as_str(), mode = %self.mode_label, "Overlay repaint");
        let (icon, verb) = match state {
            OverlayState::Recording => (TrayIconState::Recording, "Recording"),
            OverlayState::Processing => (TrayIconState::Processing, "Transcribing"),
            OverlayState::Generating => (TrayIconState::Generating, "Cleaning up"),
            OverlayState::Done => (TrayIconState::Done, "Done"),
        };
        let tooltip = if self.mode_label.is_empty() {
            format!("VoxPaste - {}...", verb)
        } else {
            format!("VoxPaste - {}... [{}]", verb, self.mode_label)
        };
        self.send(icon, tooltip)
    }
}

impl OverlaySurface for TrayOverlay {
    fn show(&mut self, state: OverlayState, mode_id: &str) -> AppResult<()> {
        self.mode_label = self.mode_label_for(mode_id);
        self.visible_state = Some(state);
        self.render(state)
    }

    fn set_state(&mut self, state: OverlayState) -> AppResult<()> {
        self.visible_state = Some(state);
        self.render(state)
    }

    fn set_mode(&mut self, mode_id: &str) -> AppResult<()> {
        self.mode_label = self.mode_label_for(mode_id);
        // Re-render only while visible; a hidden overlay keeps the label
        // for the next show.
        if let Some(state) = self.visible_state {
            self.render(state)?;
        }
        Ok(())
    }

    fn hide(&mut self) -> AppResult<()> {
        // Idempotent: hiding an already-hidden overlay just repaints Idle.
        self.visible_state = None;
        self.send(TrayIconState::Idle, "VoxPaste - Ready".to_string())
    }
}
