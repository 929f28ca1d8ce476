//! RAII guard for the paste modifier key.

use crate::{AppError, AppResult};

use std::panic::Location;

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use error_location::ErrorLocation;

/// Holds the platform paste modifier (Cmd on macOS, Ctrl elsewhere) down
/// for as long as the guard lives.
///
/// The release happens in `Drop`, so a failed or panicking key sequence
/// between press and release can never leave the modifier stuck. The
/// release itself is best-effort; if it fails, the OS clears modifier
/// state on the user's next physical key press. The guard owns the
/// `Enigo` handle, so every synthetic key event while the modifier is
/// held goes through it.
pub struct PasteKeyGuard {
    enigo: Enigo,
    modifier: Key,
}

impl PasteKeyGuard {
    /// Press the paste modifier; the returned guard releases it on drop.
    #[track_caller]
    pub(crate) fn new() -> AppResult<Self> {
        let modifier = if cfg!(target_os = "macos") {
            Key::Meta
        } else {
            Key::Control
        };

        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| AppError::AutoPasteFailed {
                reason: format!("Failed to create Enigo: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        enigo
            .key(modifier, Direction::Press)
            .map_err(|e| AppError::AutoPasteFailed {
                reason: format!("Failed to press paste modifier: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { enigo, modifier })
    }

    /// The held `Enigo`, for key events while the modifier is down.
    pub(crate) fn enigo_mut(&mut self) -> &mut Enigo {
        &mut self.enigo
    }
}

impl Drop for PasteKeyGuard {
    fn drop(&mut self) {
        let _ = self.enigo.key(self.modifier, Direction::Release);
    }
}
