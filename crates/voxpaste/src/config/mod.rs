mod audio_config;
mod cleanup_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod mode_config;
mod whisper_config;

pub(crate) use {
    audio_config::AudioConfig, cleanup_config::CleanupConfig, config::Config,
    hotkey_config::HotkeyConfig, mode_config::ModeConfig, whisper_config::WhisperConfig,
};
