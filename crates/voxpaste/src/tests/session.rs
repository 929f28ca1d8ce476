use crate::{SessionPhase, session::SETTLE_DELAY, tests::support::*};

use std::sync::atomic::Ordering;
use std::time::Duration;

/// WHAT: start() without a loaded model surfaces an error, phase unchanged
/// WHY: Recording before the model is ready must fail loudly but safely
#[tokio::test]
async fn given_no_model_when_starting_then_error_set_and_phase_unchanged() {
    // Given: A machine whose transcription model is not loaded
    let fx = fixture(FixtureConfig {
        model_loaded: false,
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Starting a session
    fx.machine.start().await;

    // Then: Error is set, phase stays Idle, capture never started
    assert_eq!(handle.phase(), SessionPhase::Idle);
    let error = handle.last_error();
    assert!(error.is_some());
    assert!(error.is_some_and(|e| e.contains("model")));
    assert!(log_entries(&fx.audio_log).is_empty());
}

/// WHAT: stop() outside Recording performs no pipeline side effects
/// WHY: A stray release event must not touch any collaborator
#[tokio::test]
async fn given_idle_phase_when_stopping_then_no_side_effects() {
    // Given: An idle machine
    let fx = fixture(FixtureConfig::default());

    // When: Stopping without a session
    fx.machine.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: No collaborator was touched
    assert!(log_entries(&fx.audio_log).is_empty());
    assert!(log_entries(&fx.overlay_log).is_empty());
    assert!(log_entries(&fx.delivery_log).is_empty());
    assert_eq!(fx.machine.handle().phase(), SessionPhase::Idle);
}

/// WHAT: A full start/stop run with cleanup disabled delivers the raw text
/// WHY: The end-to-end contract: record, transcribe, copy, paste, settle
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_happy_path_when_running_session_then_text_delivered_and_phase_settles() {
    // Given: A machine producing "buy milk and eggs"
    let fx = fixture(FixtureConfig::default());
    let handle = fx.machine.handle();

    // When: Running a full session
    fx.machine.start().await;
    assert_eq!(handle.phase(), SessionPhase::Recording);
    fx.machine.stop().await;

    // Then: The pipeline reaches Ready with the record published
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    let record = handle.last_result().unwrap();
    assert_eq!(record.raw_text, "buy milk and eggs");
    assert_eq!(record.cleaned_text, "buy milk and eggs");
    assert_eq!(record.language, "en");
    assert_eq!(record.mode_id, "default");

    assert_eq!(
        fx.clipboard.lock().unwrap().as_deref(),
        Some("buy milk and eggs")
    );
    let delivery = log_entries(&fx.delivery_log);
    assert!(delivery.contains(&"copy".to_string()));
    assert!(delivery.contains(&"notify:buy milk and eggs".to_string()));

    // And: After the settle delay the overlay hides, the paste fires, and
    // the phase returns to Idle
    tokio::time::sleep(SETTLE_DELAY + Duration::from_millis(200)).await;
    assert_eq!(handle.phase(), SessionPhase::Idle);
    assert_eq!(fx.pastes.load(Ordering::SeqCst), 1);

    let overlay = log_entries(&fx.overlay_log);
    assert!(overlay.contains(&"show:recording:default".to_string()));
    assert!(overlay.contains(&"state:processing".to_string()));
    assert!(overlay.contains(&"state:done".to_string()));
    assert!(overlay.contains(&"hide".to_string()));
    // Cleanup disabled: the generating state never appears
    assert!(!overlay.contains(&"state:generating".to_string()));

    // And: History holds the record and statistics counted the words
    let store = fx.store.lock().unwrap();
    assert_eq!(store.history.len(), 1);
    let stats = fx.machine.statistics();
    assert_eq!(stats.completed_today, 1);
    assert_eq!(stats.cumulative_word_count, 4);
    assert_eq!(stats.streak_days, 1);
}

/// WHAT: A too-short transcription aborts the run
/// WHY: Single-character noise must not reach the clipboard
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_single_char_transcription_when_stopping_then_empty_error_and_idle() {
    // Given: Transcription trims to "a"
    let fx = fixture(FixtureConfig {
        text: " a ".to_string(),
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;

    let h = handle.clone();
    assert!(wait_until(move || h.last_error().is_some()).await);

    // Then: Phase is Idle, overlay hidden, nothing recorded or delivered
    assert_eq!(handle.phase(), SessionPhase::Idle);
    assert!(log_entries(&fx.overlay_log).contains(&"hide".to_string()));
    assert!(handle.last_result().is_none());
    assert!(fx.clipboard.lock().unwrap().is_none());
    assert!(fx.store.lock().unwrap().history.is_empty());
    assert_eq!(fx.machine.statistics().completed_today, 0);
}

/// WHAT: Cleanup output replaces the raw text when it looks legitimate
/// WHY: The cleaned transcript is the product when the pass succeeds
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_cleanup_success_when_running_then_cleaned_text_used() {
    // Given: Cleanup enabled, returning "Hello, world!"
    let fx = fixture(FixtureConfig {
        text: "hello world".to_string(),
        cleanup_enabled: true,
        cleanup_reply: Ok("Hello, world!".to_string()),
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    // Then: The record carries the cleaned text and the overlay showed
    // the generating state
    let record = handle.last_result().unwrap();
    assert_eq!(record.raw_text, "hello world");
    assert_eq!(record.cleaned_text, "Hello, world!");
    assert_eq!(
        fx.clipboard.lock().unwrap().as_deref(),
        Some("Hello, world!")
    );
    assert!(log_entries(&fx.overlay_log).contains(&"state:generating".to_string()));
    // Cleanup received the text, language, and mode
    assert_eq!(
        log_entries(&fx.cleanup_calls),
        vec!["hello world|en|default".to_string()]
    );
}

/// WHAT: A refusal-shaped cleanup reply falls back to the raw text
/// WHY: "Please provide the transcript..." is not a cleaned transcript
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_refusal_reply_when_cleaning_then_raw_text_kept() {
    // Given: Cleanup parroting a refusal
    let fx = fixture(FixtureConfig {
        text: "hello world".to_string(),
        cleanup_enabled: true,
        cleanup_reply: Ok("Please provide the transcript to clean up.".to_string()),
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    // Then: The raw text wins
    let record = handle.last_result().unwrap();
    assert_eq!(record.cleaned_text, "hello world");
}

/// WHAT: A failing cleanup call is absorbed silently
/// WHY: Cleanup is best-effort; its failures never surface to the user
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_cleanup_failure_when_running_then_raw_text_kept_and_no_error() {
    // Given: Cleanup erroring out
    let fx = fixture(FixtureConfig {
        text: "hello world".to_string(),
        cleanup_enabled: true,
        cleanup_reply: Err("ollama is down".to_string()),
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    // Then: Raw text delivered, no user-visible error
    let record = handle.last_result().unwrap();
    assert_eq!(record.cleaned_text, "hello world");
    assert!(handle.last_error().is_none());
}

/// WHAT: Short transcripts skip the cleanup pass entirely
/// WHY: Cleanup only runs for trimmed length > 3
#[tokio::test]
async fn given_three_char_transcript_when_cleanup_enabled_then_pass_skipped() {
    // Given: A 3-character transcript with cleanup enabled
    let fx = fixture(FixtureConfig {
        text: "hey".to_string(),
        cleanup_enabled: true,
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    // Then: Cleanup was never called
    assert!(log_entries(&fx.cleanup_calls).is_empty());
}

/// WHAT: Near-silent audio is rejected before transcription
/// WHY: Silence produces hallucinated transcripts
#[tokio::test]
async fn given_silent_capture_when_stopping_then_quiet_error() {
    // Given: Samples below the peak-amplitude floor
    let fx = fixture(FixtureConfig {
        samples: vec![0.001; 1600],
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.last_error().is_some()).await);

    // Then: The quiet-audio error surfaces and the phase resets
    assert!(handle.last_error().is_some_and(|e| e.contains("quiet")));
    assert_eq!(handle.phase(), SessionPhase::Idle);
}

/// WHAT: A transcription failure recovers to Idle with the error recorded
/// WHY: Generic collaborator failures must hide the overlay and reset
#[tokio::test]
async fn given_transcription_failure_when_stopping_then_idle_with_error() {
    // Given: An exploding inference engine
    let fx = fixture(FixtureConfig {
        stt_fail: true,
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.last_error().is_some()).await);

    // Then: Error recorded, phase Idle, overlay hide attempted
    assert_eq!(handle.phase(), SessionPhase::Idle);
    assert!(log_entries(&fx.overlay_log).contains(&"hide".to_string()));
}

/// WHAT: Recovery hides the overlay even when the hide itself fails
/// WHY: A secondary failure must not mask the recovery path
#[tokio::test]
async fn given_failing_hide_when_pipeline_fails_then_recovery_still_completes() {
    // Given: A failing pipeline AND a failing overlay hide
    let fx = fixture(FixtureConfig {
        stt_fail: true,
        fail_hide: true,
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Running a session
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.last_error().is_some()).await);

    // Then: The hide was attempted and the phase still reset
    assert!(log_entries(&fx.overlay_log).contains(&"hide".to_string()));
    assert_eq!(handle.phase(), SessionPhase::Idle);
}

/// WHAT: start() during an active recording is a silent no-op
/// WHY: Single-flight: overlapping sessions are phase-gated out
#[tokio::test]
async fn given_recording_phase_when_starting_again_then_ignored() {
    // Given: A machine already recording
    let fx = fixture(FixtureConfig::default());
    fx.machine.start().await;

    // When: Starting again
    fx.machine.start().await;

    // Then: Capture started exactly once and no error was set
    let starts = log_entries(&fx.audio_log)
        .iter()
        .filter(|e| *e == "start")
        .count();
    assert_eq!(starts, 1);
    assert!(fx.machine.handle().last_error().is_none());
}

/// WHAT: Ready is re-entrant: a new session can start before the settle
/// WHY: Ready --start--> Recording is a legal transition
#[tokio::test]
async fn given_ready_phase_when_starting_then_new_session_begins() {
    // Given: A completed session sitting in Ready
    let fx = fixture(FixtureConfig::default());
    let handle = fx.machine.handle();
    fx.machine.start().await;
    fx.machine.stop().await;
    let h = handle.clone();
    assert!(wait_until(move || h.phase() == SessionPhase::Ready).await);

    // When: Starting again before the settle timer fires
    fx.machine.start().await;

    // Then: A new recording is in progress, and the settle timer does not
    // clobber the Recording phase when it fires
    assert_eq!(handle.phase(), SessionPhase::Recording);
    tokio::time::sleep(SETTLE_DELAY + Duration::from_millis(200)).await;
    assert_eq!(handle.phase(), SessionPhase::Recording);
}

/// WHAT: Rehydration publishes the most recent persisted record once
/// WHY: A restart should show the last transcript without re-running
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_persisted_history_when_rehydrating_then_latest_surfaces_once() {
    // Given: Two persisted records, newest first
    let older = crate::TranscriptRecord {
        raw_text: "older".into(),
        cleaned_text: "older".into(),
        language: "en".into(),
        mode_id: "default".into(),
        timestamp_millis: 1,
    };
    let newer = crate::TranscriptRecord {
        raw_text: "newer".into(),
        cleaned_text: "newer".into(),
        language: "en".into(),
        mode_id: "default".into(),
        timestamp_millis: 2,
    };
    let fx = fixture(FixtureConfig {
        initial_history: vec![newer.clone(), older],
        ..FixtureConfig::default()
    });
    let handle = fx.machine.handle();

    // When: Rehydrating twice
    fx.machine.rehydrate().await;
    let first = handle.last_result();

    fx.machine.start().await; // clears the displayed result
    fx.machine.rehydrate().await;

    // Then: The first call surfaced the newest record, the second did not
    // overwrite a cleared slot
    assert_eq!(first.unwrap().raw_text, "newer");
    assert!(handle.last_result().is_none());
}
