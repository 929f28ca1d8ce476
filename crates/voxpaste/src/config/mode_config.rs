use crate::modes::DEFAULT_MODE_ID;

use serde::{Deserialize, Serialize};

/// Output mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Selected output mode id.
    #[serde(default = "default_mode")]
    pub selected: String,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            selected: default_mode(),
        }
    }
}

fn default_mode() -> String {
    DEFAULT_MODE_ID.to_string()
}
