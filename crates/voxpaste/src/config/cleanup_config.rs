use crate::cleanup::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

use serde::{Deserialize, Serialize};

/// Ollama cleanup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Whether the cleanup pass runs in the pipeline.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Ollama model used for cleanup.
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama base endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
