//! Maps session phases to overlay visual states and the active-mode tag.

use crate::{AppResult, platform::OverlaySurface};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

/// Visual states of the session overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// Capturing audio.
    Recording,
    /// Finalizing capture / transcribing.
    Processing,
    /// Cleanup pass running.
    Generating,
    /// Pipeline finished; result delivered.
    Done,
}

impl OverlayState {
    /// Wire token for the overlay collaborator.
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayState::Recording => "recording",
            OverlayState::Processing => "processing",
            OverlayState::Generating => "generating",
            OverlayState::Done => "done",
        }
    }
}

/// Thin coordinator in front of the overlay collaborator.
///
/// Cloned into every task that touches the overlay; all clones share the
/// same surface. `hide_best_effort` exists for error recovery, where a
/// failing hide must not mask the failure being recovered from.
pub struct OverlayCoordinator<O> {
    surface: Arc<Mutex<O>>,
}

impl<O> Clone for OverlayCoordinator<O> {
    fn clone(&self) -> Self {
        Self {
            surface: Arc::clone(&self.surface),
        }
    }
}

impl<O: OverlaySurface> OverlayCoordinator<O> {
    pub fn new(surface: O) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
        }
    }

    /// Show the overlay in `state`, tagged with the active mode.
    pub async fn show(&self, state: OverlayState, mode_id: &str) -> AppResult<()> {
        self.surface.lock().await.show(state, mode_id)
    }

    /// Switch the visual state without re-showing.
    pub async fn set_state(&self, state: OverlayState) -> AppResult<()> {
        self.surface.lock().await.set_state(state)
    }

    /// Update the displayed mode tag.
    pub async fn set_mode(&self, mode_id: &str) -> AppResult<()> {
        self.surface.lock().await.set_mode(mode_id)
    }

    /// Hide the overlay, swallowing a failing hide. Issued on every error
    /// recovery even when the overlay may already be hidden; the surface
    /// contract makes hide idempotent.
    pub async fn hide_best_effort(&self) {
        if let Err(e) = self.surface.lock().await.hide() {
            warn!(error = ?e, "Failed to hide overlay during recovery");
        }
    }
}
