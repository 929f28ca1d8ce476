//! The recording session orchestrator.
//!
//! Owns the session phase and drives the stop()-triggered pipeline:
//! capture finalize, transcription, optional cleanup, history and
//! statistics bookkeeping, then clipboard delivery and the overlay
//! settle. Both trigger sources (tray-icon gesture and global hotkey)
//! funnel into [`SessionStateMachine::start`] and
//! [`SessionStateMachine::stop`]; phase-gated preconditions, not locks,
//! guarantee at most one pipeline in flight.

use crate::{
    AppError, AppResult, HistoryStore, OverlayCoordinator, OverlayState, SessionStatistics,
    TranscriptRecord,
    modes::DEFAULT_MODE_ID,
    platform::{AudioCapture, OverlaySurface, SettingsStore, SpeechToText, TextCleanup, TextDelivery},
    store::lock_unpoisoned,
    transcript::{looks_like_cleanup_refusal, now_millis},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Delay before the active mode is re-asserted to the overlay after a
/// session starts. The overlay initializes concurrently with the initial
/// show call and can miss the mode tag; the re-assertion is a required
/// compensating step, not polish.
pub const MODE_REASSERT_DELAY: Duration = Duration::from_millis(100);

/// Delay between reaching Ready and hiding the overlay + simulating the
/// paste. Gives the OS clipboard time to settle and the user a beat to see
/// the done state.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Captures quieter than this peak amplitude are rejected before
/// transcription; they produce hallucinated text.
const MIN_PEAK_AMPLITUDE: f32 = 0.01;

/// Minimum post-trim transcript length to be usable.
const MIN_TRANSCRIPT_LEN: usize = 2;

/// Cleanup is skipped for transcripts at or below this length.
const MIN_CLEANUP_LEN: usize = 3;

/// The session phase. Exactly one value at a time, owned by the machine
/// and mutated only by its transition functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session active.
    Idle,
    /// Audio capture running.
    Recording,
    /// Capture finalized, transcription in progress.
    Transcribing,
    /// Cleanup pass in progress.
    Cleaning,
    /// Pipeline finished; result delivered, settle timer pending.
    Ready,
}

struct SessionShared {
    phase: SessionPhase,
    last_error: Option<String>,
    last_result: Option<TranscriptRecord>,
    active_mode_id: String,
    session_id: Option<Uuid>,
}

/// Live view of the session state.
///
/// Trigger handlers are registered once for the process lifetime, so they
/// must read phase, model state, and mode through this shared cell rather
/// than values captured at registration time. Cloning is cheap; all clones
/// observe the same cell.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Mutex<SessionShared>>,
}

impl SessionHandle {
    fn new(active_mode_id: String) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SessionShared {
                phase: SessionPhase::Idle,
                last_error: None,
                last_result: None,
                active_mode_id,
                session_id: None,
            })),
        }
    }

    /// The current phase.
    pub fn phase(&self) -> SessionPhase {
        lock_unpoisoned(&self.shared).phase
    }

    /// The most recent user-visible error, if any.
    pub fn last_error(&self) -> Option<String> {
        lock_unpoisoned(&self.shared).last_error.clone()
    }

    /// The most recent completed (or rehydrated) transcript.
    pub fn last_result(&self) -> Option<TranscriptRecord> {
        lock_unpoisoned(&self.shared).last_result.clone()
    }

    /// The active output mode id.
    pub fn active_mode_id(&self) -> String {
        lock_unpoisoned(&self.shared).active_mode_id.clone()
    }

    /// Replace the active output mode id.
    pub fn set_active_mode(&self, mode_id: &str) {
        lock_unpoisoned(&self.shared).active_mode_id = mode_id.to_string();
    }

    /// Publish a transcript as the current displayed result.
    pub fn publish_result(&self, record: TranscriptRecord) {
        lock_unpoisoned(&self.shared).last_result = Some(record);
    }

    fn set_phase(&self, phase: SessionPhase) {
        lock_unpoisoned(&self.shared).phase = phase;
    }

    fn set_error(&self, message: String) {
        lock_unpoisoned(&self.shared).last_error = Some(message);
    }

    fn session_id(&self) -> Option<Uuid> {
        lock_unpoisoned(&self.shared).session_id
    }

    /// Clear error/result and allocate a fresh session id.
    fn begin_session(&self) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut shared = lock_unpoisoned(&self.shared);
        shared.last_error = None;
        shared.last_result = None;
        shared.session_id = Some(session_id);
        session_id
    }

    /// Ready to Idle, but only when the phase is still Ready: a session
    /// re-entered during the settle window keeps its Recording phase.
    fn downgrade_ready_to_idle(&self) {
        let mut shared = lock_unpoisoned(&self.shared);
        if shared.phase == SessionPhase::Ready {
            shared.phase = SessionPhase::Idle;
        }
    }
}

/// The session orchestrator. Generic over the collaborator contracts so
/// tests can drive it with in-memory implementations.
pub struct SessionStateMachine<A, T, C, O, D, S> {
    audio: Arc<AsyncMutex<A>>,
    stt: Arc<AsyncMutex<T>>,
    cleanup: Arc<AsyncMutex<C>>,
    overlay: OverlayCoordinator<O>,
    delivery: Arc<AsyncMutex<D>>,
    history: Arc<AsyncMutex<HistoryStore<S>>>,
    stats: Arc<Mutex<SessionStatistics>>,
    handle: SessionHandle,
}

impl<A, T, C, O, D, S> Clone for SessionStateMachine<A, T, C, O, D, S> {
    fn clone(&self) -> Self {
        Self {
            audio: Arc::clone(&self.audio),
            stt: Arc::clone(&self.stt),
            cleanup: Arc::clone(&self.cleanup),
            overlay: self.overlay.clone(),
            delivery: Arc::clone(&self.delivery),
            history: Arc::clone(&self.history),
            stats: Arc::clone(&self.stats),
            handle: self.handle.clone(),
        }
    }
}

impl<A, T, C, O, D, S> SessionStateMachine<A, T, C, O, D, S>
where
    A: AudioCapture + 'static,
    T: SpeechToText + 'static,
    C: TextCleanup + 'static,
    O: OverlaySurface + 'static,
    D: TextDelivery + 'static,
    S: SettingsStore + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        audio: Arc<AsyncMutex<A>>,
        stt: Arc<AsyncMutex<T>>,
        cleanup: Arc<AsyncMutex<C>>,
        overlay: OverlayCoordinator<O>,
        delivery: Arc<AsyncMutex<D>>,
        history: Arc<AsyncMutex<HistoryStore<S>>>,
        initial_mode_id: Option<String>,
    ) -> Self {
        let mode_id = initial_mode_id.unwrap_or_else(|| DEFAULT_MODE_ID.to_string());
        Self {
            audio,
            stt,
            cleanup,
            overlay,
            delivery,
            history,
            stats: Arc::new(Mutex::new(SessionStatistics::default())),
            handle: SessionHandle::new(mode_id),
        }
    }

    /// The live session view shared with trigger handlers and the UI.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Process-lifetime statistics.
    pub fn statistics(&self) -> SessionStatistics {
        *lock_unpoisoned(&self.stats)
    }

    /// Surface the most recent persisted transcript as the displayed
    /// result, once per process.
    pub async fn rehydrate(&self) {
        if let Some(record) = self.history.lock().await.take_rehydration() {
            self.handle.publish_result(record);
        }
    }

    /// Begin a recording session.
    ///
    /// Never errors to the caller: a missing model surfaces through the
    /// error slot, a wrong phase is a silent no-op.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        if !self.stt.lock().await.is_model_loaded() {
            let e = AppError::ModelNotLoaded {
                location: ErrorLocation::from(Location::caller()),
            };
            warn!("Recording requested without a loaded model");
            self.handle.set_error(e.user_message());
            return;
        }

        let phase = self.handle.phase();
        if phase != SessionPhase::Idle && phase != SessionPhase::Ready {
            debug!(?phase, "start ignored in current phase");
            return;
        }

        let session_id = self.handle.begin_session();
        let mode_id = self.handle.active_mode_id();

        if let Err(e) = self.audio.lock().await.start_capture() {
            error!(session_id = %session_id, error = ?e, "Failed to start capture");
            self.handle.set_error(e.user_message());
            self.handle.set_phase(SessionPhase::Idle);
            self.overlay.hide_best_effort().await;
            return;
        }

        if let Err(e) = self.overlay.show(OverlayState::Recording, &mode_id).await {
            warn!(session_id = %session_id, error = ?e, "Failed to show overlay");
        }

        // The overlay window races its own initialization against the show
        // call and can drop the mode tag; re-assert it shortly after. The
        // timer is not cancelled by a fast stop; see DESIGN.md.
        let overlay = self.overlay.clone();
        let reassert_mode = mode_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(MODE_REASSERT_DELAY).await;
            if let Err(e) = overlay.set_mode(&reassert_mode).await {
                debug!(error = ?e, "Mode re-assertion failed");
            }
        });

        self.handle.set_phase(SessionPhase::Recording);
        info!(session_id = %session_id, mode_id = %mode_id, "Recording started");
    }

    /// End the recording session and run the delivery pipeline.
    ///
    /// No-op unless the phase is Recording. Capture is finalized inline;
    /// the rest of the pipeline runs on a spawned task so trigger handling
    /// stays responsive, with the phase guard keeping runs single-flight.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        if self.handle.phase() != SessionPhase::Recording {
            debug!(phase = ?self.handle.phase(), "stop ignored in current phase");
            return;
        }

        let session_id = self.handle.session_id().unwrap_or_else(Uuid::new_v4);

        if let Err(e) = self.overlay.set_state(OverlayState::Processing).await {
            warn!(session_id = %session_id, error = ?e, "Failed to set overlay to processing");
        }

        let samples = match self.audio.lock().await.stop_capture() {
            Ok(samples) => samples,
            Err(e) => {
                self.fail(session_id, &e).await;
                return;
            }
        };

        self.handle.set_phase(SessionPhase::Transcribing);

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.run_pipeline(session_id, samples).await {
                this.fail(session_id, &e).await;
            }
        });
    }

    /// Steps 2–7 of the pipeline, strictly sequential within one run.
    async fn run_pipeline(&self, session_id: Uuid, samples: Vec<f32>) -> AppResult<()> {
        let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));
        if samples.is_empty() || peak < MIN_PEAK_AMPLITUDE {
            return Err(AppError::NativeCommand {
                reason: "Audio too quiet - check that your microphone is working and you have \
                         granted permission."
                    .to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let outcome = self.stt.lock().await.transcribe(&samples)?;
        let raw_text = outcome.text.trim().to_string();

        if raw_text.len() < MIN_TRANSCRIPT_LEN {
            return Err(AppError::EmptyTranscription {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mode_id = self.handle.active_mode_id();
        let cleanup_enabled = self.cleanup.lock().await.is_enabled();

        let cleaned_text = if cleanup_enabled && raw_text.len() > MIN_CLEANUP_LEN {
            self.handle.set_phase(SessionPhase::Cleaning);
            if let Err(e) = self.overlay.set_state(OverlayState::Generating).await {
                warn!(session_id = %session_id, error = ?e, "Failed to set overlay to generating");
            }

            let result = self
                .cleanup
                .lock()
                .await
                .cleanup(&raw_text, &outcome.language, &mode_id);

            match result {
                Ok(cleaned) if looks_like_cleanup_refusal(&cleaned) => {
                    debug!(session_id = %session_id, "Cleanup reply refusal-shaped, keeping raw text");
                    raw_text.clone()
                }
                Ok(cleaned) => cleaned,
                Err(e) => {
                    // Cleanup failures are absorbed; the raw transcript is
                    // always deliverable.
                    debug!(session_id = %session_id, error = ?e, "Cleanup failed, keeping raw text");
                    raw_text.clone()
                }
            }
        } else {
            raw_text.clone()
        };

        let record = TranscriptRecord {
            raw_text,
            cleaned_text,
            language: outcome.language,
            mode_id,
            timestamp_millis: now_millis(),
        };
        let final_text = record.final_text().to_string();

        self.history.lock().await.push(record.clone());
        lock_unpoisoned(&self.stats).record_completion(&final_text);

        {
            let mut delivery = self.delivery.lock().await;
            delivery.copy_to_clipboard(&final_text)?;
            delivery.notify_recent_transcript(&final_text)?;
        }

        if let Err(e) = self.overlay.set_state(OverlayState::Done).await {
            warn!(session_id = %session_id, error = ?e, "Failed to set overlay to done");
        }

        self.handle.publish_result(record);
        self.handle.set_phase(SessionPhase::Ready);

        info!(
            session_id = %session_id,
            text_len = final_text.len(),
            "Session complete"
        );

        // Settle: hide the overlay and paste, unconditionally, once Ready
        // was reached, even if a new session has started in the meantime.
        // Known ordering hazard, kept as-is; see DESIGN.md.
        let overlay = self.overlay.clone();
        let delivery = Arc::clone(&self.delivery);
        let handle = self.handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SETTLE_DELAY).await;
            overlay.hide_best_effort().await;
            if let Err(e) = delivery.lock().await.simulate_paste() {
                warn!(error = ?e, "Auto-paste failed, text remains on the clipboard");
            }
            handle.downgrade_ready_to_idle();
        });

        Ok(())
    }

    /// Shared failure recovery: record the error, force Idle, hide the
    /// overlay best-effort.
    async fn fail(&self, session_id: Uuid, e: &AppError) {
        if e.is_empty_transcription() {
            info!(session_id = %session_id, "Transcription empty");
        } else {
            error!(session_id = %session_id, error = ?e, "Session pipeline failed");
        }
        self.handle.set_error(e.user_message());
        self.handle.set_phase(SessionPhase::Idle);
        self.overlay.hide_best_effort().await;
    }
}
