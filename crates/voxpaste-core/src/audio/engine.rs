use crate::{AudioError, CoreResult};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Result of a single transcription run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// The transcribed text, whitespace-trimmed.
    pub text: String,
    /// Detected language code (e.g. "en"), or "auto" when detection failed.
    pub language: String,
}

#[track_caller]
fn inference_err(source: Box<dyn std::error::Error + Send + Sync>) -> AudioError {
    AudioError::TranscriptionFailed {
        source,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Whisper speech-to-text engine with lazy model loading.
///
/// The context is absent until [`SttEngine::load`] succeeds, so the app can
/// launch and expose its settings surface before a model is on disk.
pub struct SttEngine {
    ctx: Option<WhisperContext>,
}

impl SttEngine {
    pub fn new() -> Self {
        Self { ctx: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.ctx.is_some()
    }

    /// Load a Whisper model from disk, replacing any previous context.
    #[track_caller]
    #[instrument(skip(self, model_path))]
    pub fn load<P: AsRef<Path>>(&mut self, model_path: P, use_gpu: bool) -> CoreResult<()> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(AudioError::ModelNotFound {
                path: path.to_path_buf(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu = use_gpu;

        let path_str = path.to_str().ok_or(AudioError::ModelNotFound {
            path: path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| inference_err(Box::new(e)))?;

        self.ctx = Some(ctx);

        info!(model_path = ?path, use_gpu, "Whisper model loaded");

        Ok(())
    }

    /// Run inference on 16kHz mono samples, detecting the spoken language.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn transcribe(&mut self, samples: &[f32]) -> CoreResult<Transcription> {
        if samples.is_empty() {
            return Err(AudioError::NoAudioCaptured {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let ctx = self.ctx.as_ref().ok_or(AudioError::ModelNotLoaded {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // language = None turns on auto-detection; the detected id is read
        // back from the state below. Never translate.
        params.set_language(None);
        params.set_translate(false);
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        let mut state = ctx.create_state().map_err(|e| inference_err(Box::new(e)))?;

        state
            .full(params, samples)
            .map_err(|e| inference_err(Box::new(e)))?;

        let num_segments = state.full_n_segments();

        let mut pieces = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| inference_err(format!("Failed to get segment {}", i).into()))?;
            pieces.push(segment.to_string());
        }

        let text = pieces.join(" ").trim().to_string();

        let language = state
            .full_lang_id_from_state()
            .ok()
            .and_then(whisper_rs::get_lang_str)
            .unwrap_or("auto")
            .to_string();

        debug!(
            sample_count = samples.len(),
            segment_count = num_segments,
            text_len = text.len(),
            language = %language,
            "Transcription complete"
        );

        Ok(Transcription { text, language })
    }
}
