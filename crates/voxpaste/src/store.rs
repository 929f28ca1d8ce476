//! Settings persistence over the TOML config plus a JSON history file.

use crate::{
    AppError, AppResult, HotkeyBinding, TranscriptRecord, config::Config, platform::SettingsStore,
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tracing::{debug, error};

/// Lock a std mutex, recovering from poison. The guarded state stays
/// valid after a holder panic; dropping it would lose settings or phase
/// state for no benefit.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| {
        error!("Mutex poisoned, recovering");
        e.into_inner()
    })
}

/// Atomic file replacement: write to a sibling temp file, fsync, rename.
/// A crash mid-write leaves the previous file intact.
pub(crate) fn write_atomic(path: &Path, temp_extension: &str, contents: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension(temp_extension);

    let mut temp_file = fs::File::create(&temp_path)?;
    temp_file.write_all(contents)?;
    temp_file.sync_all()?;

    fs::rename(&temp_path, path)
}

/// [`SettingsStore`] implementation: scalar settings live in the TOML
/// config (atomic write-then-rename), history in `history.json`.
pub struct ConfigStore {
    config: Config,
    history_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config: Config) -> AppResult<Self> {
        let history_path = Config::history_path()?;
        Ok(Self {
            config,
            history_path,
        })
    }

    /// Read access to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn persist(&self) -> AppResult<()> {
        self.config.save()
    }
}

impl SettingsStore for ConfigStore {
    fn save_binding(&mut self, binding: &HotkeyBinding) -> AppResult<()> {
        self.config.hotkey.binding = binding.clone();
        self.persist()
    }

    fn save_hotkey_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.config.hotkey.enabled = enabled;
        self.persist()
    }

    fn save_cleanup_enabled(&mut self, enabled: bool) -> AppResult<()> {
        self.config.cleanup.enabled = enabled;
        self.persist()
    }

    fn save_selected_device(&mut self, device_id: Option<&str>) -> AppResult<()> {
        self.config.audio.selected_device = device_id.map(str::to_string);
        self.persist()
    }

    fn save_selected_mode(&mut self, mode_id: &str) -> AppResult<()> {
        self.config.mode.selected = mode_id.to_string();
        self.persist()
    }

    fn save_history(&mut self, records: &[TranscriptRecord]) -> AppResult<()> {
        let contents = serde_json::to_vec_pretty(records).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize history: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        write_atomic(&self.history_path, "json.tmp", &contents)?;

        debug!(count = records.len(), "History persisted");

        Ok(())
    }

    fn load_history(&self) -> AppResult<Vec<TranscriptRecord>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.history_path)?;

        serde_json::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse history: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
