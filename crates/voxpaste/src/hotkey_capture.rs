//! Hotkey capture: converts raw key events into a canonical binding and
//! manages global-hotkey (de)registration.
//!
//! While capturing, every raw key event is either committed as the new
//! binding or ignored. Two commit paths exist: a right-side modifier key
//! pressed on its own becomes a standalone primary key (push-to-talk on a
//! single physical key), and any other key commits once at least one
//! modifier is held.

use crate::{
    HotkeyBinding, ModifierKey,
    platform::{HotkeyRegistrar, SettingsStore},
    store::lock_unpoisoned,
};

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use tracing::{debug, error, info, instrument, warn};

/// A platform-free raw key event, as delivered by the capture window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Physical key code token, e.g. "ShiftRight", "Space", "KeyA".
    pub code: String,
    /// Logical key value, e.g. "a", " ", "Shift".
    pub key: String,
    /// Modifiers held when the event fired.
    pub held: BTreeSet<ModifierKey>,
}

/// Captures a new [`HotkeyBinding`] from raw key events and keeps the
/// global-hotkey registration in sync with the binding and enabled flag.
pub struct HotkeyCaptureEngine<R, S> {
    binding: HotkeyBinding,
    enabled: bool,
    capturing: bool,
    registrar: R,
    store: Arc<Mutex<S>>,
}

impl<R, S> HotkeyCaptureEngine<R, S>
where
    R: HotkeyRegistrar,
    S: SettingsStore,
{
    pub fn new(binding: HotkeyBinding, enabled: bool, registrar: R, store: Arc<Mutex<S>>) -> Self {
        Self {
            binding,
            enabled,
            capturing: false,
            registrar,
            store,
        }
    }

    /// The current binding.
    pub fn binding(&self) -> &HotkeyBinding {
        &self.binding
    }

    /// Whether the global hotkey feature is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a capture is in progress.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Start listening for the next binding. Raw key events are ignored
    /// outside capture mode.
    #[instrument(skip(self))]
    pub fn begin_capture(&mut self) {
        self.capturing = true;
        info!("Hotkey capture started");
    }

    /// Abort capture without changing the binding.
    pub fn cancel_capture(&mut self) {
        if self.capturing {
            self.capturing = false;
            info!("Hotkey capture cancelled");
        }
    }

    /// Feed one raw key event. Returns the newly committed binding, or
    /// `None` when the event did not produce a commit (not capturing, no
    /// modifier held, or a bare modifier key on the non-standalone path).
    #[instrument(skip(self, event))]
    pub fn on_raw_key_event(&mut self, event: &RawKeyEvent) -> Option<HotkeyBinding> {
        if !self.capturing {
            return None;
        }

        // A right-side modifier pressed on its own is accepted as a
        // standalone trigger: its code becomes the primary key and the
        // pressed modifier itself never self-includes in the set.
        if let Some(pressed) = ModifierKey::from_right_code(&event.code) {
            let modifiers: BTreeSet<ModifierKey> = event
                .held
                .iter()
                .copied()
                .filter(|m| *m != pressed)
                .collect();
            let binding = HotkeyBinding::new(event.code.clone(), modifiers);
            self.commit(binding.clone());
            return Some(binding);
        }

        let modifiers = event.held.clone();
        let key = normalize_logical_key(&event.key);

        // A binding needs at least one modifier, and the key itself must
        // not be a modifier; otherwise keep listening.
        if modifiers.is_empty() || ModifierKey::is_modifier_name(&key) {
            debug!(code = %event.code, key = %key, "Ignored capture event");
            return None;
        }

        let binding = HotkeyBinding::new(key, modifiers);
        self.commit(binding.clone());
        Some(binding)
    }

    /// Toggle the global hotkey feature; registration follows the flag.
    #[instrument(skip(self))]
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        if enabled {
            if let Err(e) = self.registrar.register(&self.binding) {
                error!(error = ?e, "Failed to register hotkey");
            }
        } else if let Err(e) = self.registrar.unregister_all() {
            warn!(error = ?e, "Failed to unregister hotkeys");
        }

        if let Err(e) = lock_unpoisoned(&self.store).save_hotkey_enabled(enabled) {
            warn!(error = ?e, "Failed to persist hotkey enabled flag");
        }

        info!(enabled, "Global hotkey toggled");
    }

    fn commit(&mut self, binding: HotkeyBinding) {
        info!(binding = %binding.display(), "Hotkey binding captured");

        if let Err(e) = lock_unpoisoned(&self.store).save_binding(&binding) {
            warn!(error = ?e, "Failed to persist hotkey binding");
        }

        self.binding = binding;
        self.capturing = false;

        // Re-register only while the feature is on; a disabled hotkey
        // keeps the new binding dormant until re-enabled.
        if self.enabled {
            if let Err(e) = self.registrar.unregister_all() {
                warn!(error = ?e, "Failed to unregister previous hotkey");
            }
            if let Err(e) = self.registrar.register(&self.binding) {
                error!(error = ?e, "Failed to register captured hotkey");
            }
        }
    }
}

/// Normalize a logical key value for use as a binding's primary key: a
/// literal space becomes the named "Space" token and any single printable
/// character is upper-cased. Named keys pass through unchanged.
fn normalize_logical_key(key: &str) -> String {
    if key == " " {
        return "Space".to_string();
    }
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_uppercase().collect(),
        _ => key.to_string(),
    }
}
