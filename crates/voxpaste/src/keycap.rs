//! Converts tao keyboard events into platform-free raw key events for the
//! hotkey capture engine.

use crate::{ModifierKey, hotkey_capture::RawKeyEvent};

use std::collections::BTreeSet;

use tao::{event::KeyEvent, keyboard::ModifiersState};

/// Build a capture event from a tao key press and the currently held
/// modifiers (tracked from `WindowEvent::ModifiersChanged`).
pub fn raw_key_event(event: &KeyEvent, held: ModifiersState) -> RawKeyEvent {
    let code = normalize_code_token(&format!("{:?}", event.physical_key));
    let key = logical_from_code(&code);
    RawKeyEvent {
        code,
        key,
        held: modifier_set(held),
    }
}

/// Collect held modifiers in the canonical order.
pub fn modifier_set(mods: ModifiersState) -> BTreeSet<ModifierKey> {
    let mut set = BTreeSet::new();
    if mods.super_key() {
        set.insert(ModifierKey::Meta);
    }
    if mods.shift_key() {
        set.insert(ModifierKey::Shift);
    }
    if mods.alt_key() {
        set.insert(ModifierKey::Alt);
    }
    if mods.control_key() {
        set.insert(ModifierKey::Control);
    }
    set
}

/// Canonicalize a physical-key debug token. tao names the OS/command key
/// "Super"; the canonical binding vocabulary follows the W3C "Meta" codes.
pub(crate) fn normalize_code_token(token: &str) -> String {
    match token {
        "SuperLeft" => "MetaLeft".to_string(),
        "SuperRight" => "MetaRight".to_string(),
        other => other.to_string(),
    }
}

/// Derive the logical key value from a physical code token: letters and
/// digits become their character, Space becomes the literal space the
/// capture engine expects, modifiers report their modifier name, and
/// named keys pass through.
pub(crate) fn logical_from_code(code: &str) -> String {
    if let Some(letter) = code.strip_prefix("Key") {
        if letter.chars().count() == 1 {
            return letter.to_lowercase();
        }
    }
    if let Some(digit) = code.strip_prefix("Digit") {
        if digit.chars().count() == 1 {
            return digit.to_string();
        }
    }
    match code {
        "Space" => " ".to_string(),
        "MetaLeft" | "MetaRight" => "Meta".to_string(),
        "ShiftLeft" | "ShiftRight" => "Shift".to_string(),
        "AltLeft" | "AltRight" => "Alt".to_string(),
        "ControlLeft" | "ControlRight" => "Control".to_string(),
        other => other.to_string(),
    }
}
