//! Transcript cleanup through a local Ollama instance.
//!
//! Failures here are always absorbed by the pipeline (the raw transcript
//! is delivered instead), so every error maps to `CleanupFailed`.

use crate::{
    AppError, AppResult,
    modes::{system_prompt, user_prompt},
    platform::TextCleanup,
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default Ollama endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default cleanup model.
pub const DEFAULT_MODEL: &str = "gemma2:2b";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    /// Always empty: each cleanup is independent, no chat history.
    context: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama-backed cleanup engine.
pub struct OllamaCleanup {
    endpoint: String,
    model: String,
    enabled: bool,
}

impl OllamaCleanup {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, enabled: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            enabled,
        }
    }

    /// Run `f` on a plain thread. The blocking reqwest client may not be
    /// created or driven from inside the tokio runtime, and cleanup calls
    /// arrive on runtime workers.
    fn off_runtime<T: Send + 'static>(
        f: impl FnOnce() -> AppResult<T> + Send + 'static,
    ) -> AppResult<T> {
        std::thread::spawn(f)
            .join()
            .map_err(|_| AppError::CleanupFailed {
                reason: "Cleanup worker thread panicked".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?
    }
}

impl TextCleanup for OllamaCleanup {
    /// Whether Ollama is reachable. Used to gate non-default output modes.
    #[instrument(skip(self))]
    fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);

        let probe = Self::off_runtime(move || {
            let client = reqwest::blocking::Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .map_err(|e| AppError::CleanupFailed {
                    reason: format!("Failed to build probe client: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            let response = client.get(&url).send().map_err(|e| AppError::CleanupFailed {
                reason: format!("Ollama probe failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
            Ok(response.status().is_success())
        });

        match probe {
            Ok(up) => up,
            Err(e) => {
                debug!(error = ?e, "Ollama unavailable");
                false
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[instrument(skip(self, text))]
    fn cleanup(&self, text: &str, language: &str, mode_id: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let lang_name = language_display_name(language);
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: user_prompt(mode_id, lang_name, text),
            system: system_prompt(mode_id, lang_name),
            stream: false,
            context: Some(vec![]),
        };
        let url = format!("{}/api/generate", self.endpoint);

        let reply = Self::off_runtime(move || {
            let client = reqwest::blocking::Client::builder()
                .timeout(GENERATE_TIMEOUT)
                .build()
                .map_err(|e| AppError::CleanupFailed {
                    reason: format!("Failed to build client: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let response = client
                .post(&url)
                .json(&request)
                .send()
                .map_err(|e| AppError::CleanupFailed {
                    reason: if e.is_connect() {
                        "Ollama is not running. Start Ollama or disable AI cleanup.".to_string()
                    } else {
                        format!("Failed to send request to Ollama: {}", e)
                    },
                    location: ErrorLocation::from(Location::caller()),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                return Err(AppError::CleanupFailed {
                    reason: format!("Ollama returned error {}: {}", status, body),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            let parsed: GenerateResponse =
                response.json().map_err(|e| AppError::CleanupFailed {
                    reason: format!("Failed to parse Ollama response: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            Ok(parsed.response)
        })?;

        // Models occasionally wrap the reply in quotes; strip them along
        // with stray whitespace.
        let cleaned = reply.trim().trim_matches('"').trim().to_string();

        debug!(
            input_len = text.len(),
            output_len = cleaned.len(),
            "Cleanup complete"
        );

        Ok(cleaned)
    }
}

/// English display name for a detected language code; the cleanup prompts
/// name the language explicitly to keep models from translating.
pub fn language_display_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "fr" => "French",
        "es" => "Spanish",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "ru" => "Russian",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "auto" | "" => "the same language",
        other => other,
    }
}
