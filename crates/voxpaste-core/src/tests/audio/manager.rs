use crate::{AudioError, audio::AudioManager};

/// WHAT: Manager construction and lazy model loading work against hardware
/// WHY: End-to-end smoke test of the capture + engine wiring
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
fn given_default_device_when_creating_manager_then_no_model_loaded() {
    // Given/When: A manager bound to the default input device
    let manager = AudioManager::new().unwrap();

    // Then: No model is loaded until load_model is called
    assert!(!manager.is_model_loaded());
    assert!(!manager.is_recording());
}

/// WHAT: Loading a missing model through the manager surfaces ModelNotFound
/// WHY: The app persists a model path that may not exist yet
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
fn given_invalid_model_path_when_loading_then_model_not_found_error() {
    // Given: A manager and a bogus path
    let mut manager = AudioManager::new().unwrap();

    // When: Loading a model that does not exist
    let result = manager.load_model("/nonexistent/model.bin", false);

    // Then: ModelNotFound, and the manager remains usable without a model
    assert!(matches!(result, Err(AudioError::ModelNotFound { .. })));
    assert!(!manager.is_model_loaded());
}
