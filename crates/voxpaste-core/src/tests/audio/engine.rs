use crate::{AudioError, audio::SttEngine};

use std::path::PathBuf;

/// WHAT: A fresh engine reports no model loaded
/// WHY: The app gates recording on model availability
#[test]
fn given_new_engine_when_queried_then_no_model_loaded() {
    // Given/When: A freshly constructed engine
    let engine = SttEngine::new();

    // Then: No model is loaded
    assert!(!engine.is_loaded());
}

/// WHAT: Loading a non-existent model path fails early
/// WHY: Early validation prevents runtime failures mid-session
#[test]
fn given_invalid_model_path_when_loading_then_model_not_found_error() {
    // Given: Path to non-existent Whisper model
    let invalid_path = PathBuf::from("/nonexistent/model.bin");
    let mut engine = SttEngine::new();

    // When: Attempting to load the model
    let result = engine.load(&invalid_path, false);

    // Then: Returns ModelNotFound and the engine stays unloaded
    assert!(matches!(result, Err(AudioError::ModelNotFound { .. })));
    assert!(!engine.is_loaded());
}

/// WHAT: Transcribing without a loaded model is rejected
/// WHY: Lazy loading must surface a clear error, not crash
#[test]
fn given_unloaded_engine_when_transcribing_then_model_not_loaded_error() {
    // Given: An engine without a model
    let mut engine = SttEngine::new();
    let samples = vec![0.1f32; 16_000];

    // When: Attempting to transcribe
    let result = engine.transcribe(&samples);

    // Then: Returns ModelNotLoaded
    assert!(matches!(result, Err(AudioError::ModelNotLoaded { .. })));
}

/// WHAT: Empty samples cause NoAudioCaptured error
/// WHY: Transcription should not run on empty audio
#[test]
fn given_empty_samples_when_transcribing_then_no_audio_captured_error() {
    // Given: An engine (model state irrelevant; the sample check runs first)
    let mut engine = SttEngine::new();
    let empty_samples: Vec<f32> = vec![];

    // When: Attempting to transcribe empty samples
    let result = engine.transcribe(&empty_samples);

    // Then: Returns NoAudioCaptured
    assert!(matches!(result, Err(AudioError::NoAudioCaptured { .. })));
}
