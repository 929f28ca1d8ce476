//! TOML configuration for voxpaste: cross-platform paths, atomic saves,
//! lazy model-path validation.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, CleanupConfig, HotkeyConfig, ModeConfig, WhisperConfig},
    store::write_atomic,
};

use std::{fs, panic::Location, path::PathBuf};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

#[track_caller]
fn config_err(reason: String) -> AppError {
    AppError::ConfigError {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// The persisted application configuration. Every section except
/// `[whisper]` is optional in the file and defaults itself in, so config
/// files written by older versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Whisper model configuration.
    pub whisper: WhisperConfig,
    /// Audio device configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Global hotkey configuration.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Ollama cleanup configuration.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Output mode configuration.
    #[serde(default)]
    pub mode: ModeConfig,
}

impl Config {
    /// Load the configuration, writing a default file on first launch.
    ///
    /// The model path is deliberately NOT validated here. The model loads
    /// lazily so the app can launch before one has been downloaded; a
    /// missing file surfaces when recording is attempted.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("No config found, creating default");
            return Self::create_default();
        }

        let contents = fs::read_to_string(&config_path)
            .map_err(|e| config_err(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| config_err(format!("Failed to parse config: {}", e)))?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Whether the configured Whisper model file exists on disk.
    pub fn model_present(&self) -> bool {
        self.whisper.model_path.exists()
    }

    /// Persist the configuration with an atomic write-then-rename, so a
    /// crash mid-save cannot corrupt the file.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| config_err(format!("Failed to serialize config: {}", e)))?;

        write_atomic(&config_path, "toml.tmp", contents.as_bytes())
            .map_err(|e| config_err(format!("Failed to write config: {}", e)))?;

        debug!(config_path = ?config_path, "Configuration saved");

        Ok(())
    }

    /// Directory holding the config file, for the tray's "open config"
    /// entry.
    #[track_caller]
    pub fn config_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Path of the persisted transcript history.
    #[track_caller]
    pub fn history_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let data_dir = proj_dirs.data_dir();

        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
            debug!(data_dir = ?data_dir, "Created data directory");
        }

        Ok(data_dir.join("history.json"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "voxpaste", "VoxPaste")
            .ok_or_else(|| config_err("Failed to get project directories".to_string()))
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let model_path = proj_dirs.data_dir().join("models").join("ggml-base.bin");

        let config = Config {
            whisper: WhisperConfig {
                model_path: model_path.clone(),
                use_gpu: true,
            },
            audio: AudioConfig::default(),
            hotkey: HotkeyConfig::default(),
            cleanup: CleanupConfig::default(),
            mode: ModeConfig::default(),
        };

        config.save()?;

        warn!(
            model_path = ?model_path,
            "Default config created. Whisper model must be downloaded before recording."
        );

        Ok(config)
    }
}
