//! System tray icon with state-based updates and a rebuildable menu.
//!
//! The tray is the app's entire UI surface: the icon doubles as the
//! session overlay (five states), pressing and holding it is the gesture
//! trigger, and the menu exposes recent transcripts, mode selection, the
//! feature toggles, and hotkey capture. Menu items carry stable string
//! ids so the menu can be rebuilt wholesale without invalidating the
//! handlers that match on them.

use crate::{AppError, AppResult, SessionStatistics, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tray_icon::menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Recent transcripts shown in the menu. History keeps ten; the menu
/// shows a skimmable three.
const MENU_TRANSCRIPTS: usize = 3;

/// Menu label truncation length.
const TRANSCRIPT_LABEL_CHARS: usize = 47;

/// Everything the menu renders; the app thread mutates this through
/// [`TrayManager`] setters, each of which rebuilds the menu.
pub struct TrayMenuModel {
    /// Recent transcripts, most recent first.
    pub transcripts: Vec<String>,
    /// Session statistics line; absent until the first completed run.
    pub stats: Option<SessionStatistics>,
    /// Mode catalog as (id, label) pairs, in menu order.
    pub modes: Vec<(String, String)>,
    /// Active mode id, for the checkmark.
    pub active_mode: String,
    /// Input devices as (selection id, label) pairs; `None` = default.
    pub devices: Vec<(Option<String>, String)>,
    /// Selected device id, for the checkmark.
    pub active_device: Option<String>,
    /// Cleanup toggle state.
    pub cleanup_enabled: bool,
    /// Hotkey toggle state.
    pub hotkey_enabled: bool,
    /// Rendered binding, shown in the capture entry.
    pub hotkey_label: String,
}

/// System tray icon manager. Lives on the main thread; `TrayIcon` is
/// `!Send` on every platform.
pub struct TrayManager {
    tray_icon: TrayIcon,
    model: TrayMenuModel,
}

impl TrayManager {
    /// Create the tray with its initial menu and the Idle icon.
    #[track_caller]
    pub fn new(model: TrayMenuModel) -> AppResult<Self> {
        let menu = Self::build_menu(&model)?;
        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("VoxPaste - Ready")
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { tray_icon, model })
    }

    /// Update the tray icon and tooltip.
    #[track_caller]
    pub fn update_state(&mut self, state: TrayIconState, tooltip: &str) -> AppResult<()> {
        let icon = Self::load_icon(state)?;

        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Prepend a transcript to the recent list.
    pub fn push_transcript(&mut self, text: String) -> AppResult<()> {
        self.model.transcripts.insert(0, text);
        self.model.transcripts.truncate(MENU_TRANSCRIPTS);
        self.rebuild()
    }

    /// Replace the recent list (startup rehydration).
    pub fn seed_transcripts(&mut self, transcripts: Vec<String>) -> AppResult<()> {
        self.model.transcripts = transcripts;
        self.model.transcripts.truncate(MENU_TRANSCRIPTS);
        self.rebuild()
    }

    /// Move the mode checkmark.
    pub fn set_active_mode(&mut self, mode_id: String) -> AppResult<()> {
        self.model.active_mode = mode_id;
        self.rebuild()
    }

    /// Reflect the cleanup toggle.
    pub fn set_cleanup_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.model.cleanup_enabled = enabled;
        self.rebuild()
    }

    /// Reflect the hotkey toggle.
    pub fn set_hotkey_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.model.hotkey_enabled = enabled;
        self.rebuild()
    }

    /// Show a newly captured binding.
    pub fn set_hotkey_label(&mut self, label: String) -> AppResult<()> {
        self.model.hotkey_label = label;
        self.rebuild()
    }

    /// Replace the microphone list (startup enumeration).
    pub fn set_devices(
        &mut self,
        devices: Vec<(Option<String>, String)>,
        active: Option<String>,
    ) -> AppResult<()> {
        self.model.devices = devices;
        self.model.active_device = active;
        self.rebuild()
    }

    /// Move the microphone checkmark.
    pub fn set_active_device(&mut self, device_id: Option<String>) -> AppResult<()> {
        self.model.active_device = device_id;
        self.rebuild()
    }

    /// Refresh the statistics line.
    pub fn set_stats(&mut self, stats: SessionStatistics) -> AppResult<()> {
        self.model.stats = Some(stats);
        self.rebuild()
    }

    fn rebuild(&mut self) -> AppResult<()> {
        let menu = Self::build_menu(&self.model)?;
        self.tray_icon.set_menu(Some(Box::new(menu)));
        Ok(())
    }

    fn build_menu(model: &TrayMenuModel) -> AppResult<Menu> {
        let menu = Menu::new();
        let append_err = |e: tray_icon::menu::Error| AppError::ConfigError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        };

        if model.transcripts.is_empty() {
            let placeholder =
                MenuItem::with_id("no_transcripts", "No transcripts yet", false, None);
            menu.append(&placeholder).map_err(append_err)?;
        } else {
            for (i, text) in model.transcripts.iter().enumerate() {
                let item = MenuItem::with_id(
                    format!("transcript:{}", i),
                    transcript_label(text),
                    true,
                    None,
                );
                menu.append(&item).map_err(append_err)?;
            }
        }

        if let Some(stats) = &model.stats {
            let line = format!(
                "Today: {} \u{00b7} Words: {}",
                stats.completed_today, stats.cumulative_word_count
            );
            let item = MenuItem::with_id("stats", line, false, None);
            menu.append(&item).map_err(append_err)?;
        }

        menu.append(&PredefinedMenuItem::separator())
            .map_err(append_err)?;

        let mode_menu = Submenu::new("Mode", true);
        for (id, label) in &model.modes {
            let item = CheckMenuItem::with_id(
                format!("mode:{}", id),
                label,
                true,
                *id == model.active_mode,
                None,
            );
            mode_menu.append(&item).map_err(append_err)?;
        }
        menu.append(&mode_menu).map_err(append_err)?;

        let device_menu = Submenu::new("Microphone", true);
        for (id, label) in &model.devices {
            let menu_id = match id {
                Some(name) => format!("device:{}", name),
                None => "device:default".to_string(),
            };
            let item = CheckMenuItem::with_id(
                menu_id,
                label,
                true,
                *id == model.active_device,
                None,
            );
            device_menu.append(&item).map_err(append_err)?;
        }
        menu.append(&device_menu).map_err(append_err)?;

        let cleanup_item = CheckMenuItem::with_id(
            "toggle_cleanup",
            "AI Cleanup",
            true,
            model.cleanup_enabled,
            None,
        );
        menu.append(&cleanup_item).map_err(append_err)?;

        let hotkey_item = CheckMenuItem::with_id(
            "toggle_hotkey",
            "Global Hotkey",
            true,
            model.hotkey_enabled,
            None,
        );
        menu.append(&hotkey_item).map_err(append_err)?;

        let capture_item = MenuItem::with_id(
            "capture_hotkey",
            format!("Set Hotkey\u{2026} ({})", model.hotkey_label),
            true,
            None,
        );
        menu.append(&capture_item).map_err(append_err)?;

        let open_config = MenuItem::with_id("open_config", "Open Config Folder", true, None);
        menu.append(&open_config).map_err(append_err)?;

        menu.append(&PredefinedMenuItem::separator())
            .map_err(append_err)?;

        let quit = MenuItem::with_id("quit", "Quit", true, None);
        menu.append(&quit).map_err(append_err)?;

        Ok(menu)
    }

    /// Load icon from compile-time embedded PNG bytes.
    ///
    /// Icons are embedded via include_bytes! so they work regardless of
    /// install location - no hardcoded filesystem paths.
    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let png_bytes: &[u8] = match state {
            TrayIconState::Idle => include_bytes!("../resources/icons/idle.png"),
            TrayIconState::Recording => include_bytes!("../resources/icons/recording.png"),
            TrayIconState::Processing => include_bytes!("../resources/icons/processing.png"),
            TrayIconState::Generating => include_bytes!("../resources/icons/generating.png"),
            TrayIconState::Done => include_bytes!("../resources/icons/done.png"),
        };

        let img = image::load_from_memory(png_bytes).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to decode embedded icon: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Menu label for a transcript, truncated on a character boundary.
pub(crate) fn transcript_label(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > TRANSCRIPT_LABEL_CHARS + 3 {
        let truncated: String = flat.chars().take(TRANSCRIPT_LABEL_CHARS).collect();
        format!("{}\u{2026}", truncated)
    } else {
        flat
    }
}
