use crate::HotkeyBinding;

use serde::{Deserialize, Serialize};

/// Global hotkey configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// The push-to-talk binding.
    #[serde(default)]
    pub binding: HotkeyBinding,

    /// Whether the global hotkey is registered.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            binding: HotkeyBinding::default(),
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
