//! Canonical global-trigger binding: one primary key plus a modifier set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A modifier key, in the fixed collection/display order.
///
/// The derived `Ord` makes a `BTreeSet` iterate Meta, Shift, Alt, Control:
/// the order modifiers are collected during capture and rendered in the
/// formatted binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    /// Command / Windows / Super.
    Meta,
    /// Shift.
    Shift,
    /// Alt / Option.
    Alt,
    /// Control.
    Control,
}

impl ModifierKey {
    /// All modifiers in collection order.
    pub const ALL: [ModifierKey; 4] = [
        ModifierKey::Meta,
        ModifierKey::Shift,
        ModifierKey::Alt,
        ModifierKey::Control,
    ];

    /// The logical-key name this modifier reports (e.g. "Shift").
    pub fn name(self) -> &'static str {
        match self {
            ModifierKey::Meta => "Meta",
            ModifierKey::Shift => "Shift",
            ModifierKey::Alt => "Alt",
            ModifierKey::Control => "Control",
        }
    }

    /// Display glyph.
    pub fn glyph(self) -> &'static str {
        match self {
            ModifierKey::Meta => "\u{2318}",    // ⌘
            ModifierKey::Shift => "\u{21e7}",   // ⇧
            ModifierKey::Alt => "\u{2325}",     // ⌥
            ModifierKey::Control => "\u{2303}", // ⌃
        }
    }

    /// Physical code of this modifier's right-side key.
    pub fn right_code(self) -> &'static str {
        match self {
            ModifierKey::Meta => "MetaRight",
            ModifierKey::Shift => "ShiftRight",
            ModifierKey::Alt => "AltRight",
            ModifierKey::Control => "ControlRight",
        }
    }

    /// The modifier whose right-side physical code is `code`, if any.
    pub fn from_right_code(code: &str) -> Option<ModifierKey> {
        ModifierKey::ALL.into_iter().find(|m| m.right_code() == code)
    }

    /// Whether `key` is a modifier's logical-key name. Bindings may not
    /// use a bare modifier name as their primary key.
    pub fn is_modifier_name(key: &str) -> bool {
        ModifierKey::ALL.iter().any(|m| m.name() == key)
    }
}

/// Canonical primary-key + modifier-set representation of the global
/// trigger. Immutable; recapture replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    /// Primary key token: a named code ("Space", "MetaRight"), or a
    /// single upper-cased printable character.
    pub primary_key: String,
    /// Modifiers held alongside the primary key.
    pub modifiers: BTreeSet<ModifierKey>,
}

impl HotkeyBinding {
    /// Build a binding, dropping any modifier that names the primary key
    /// itself (a binding never self-includes its own key as a modifier).
    pub fn new(primary_key: impl Into<String>, modifiers: BTreeSet<ModifierKey>) -> Self {
        let primary_key = primary_key.into();
        let modifiers = modifiers
            .into_iter()
            .filter(|m| m.right_code() != primary_key && m.name() != primary_key)
            .collect();
        Self {
            primary_key,
            modifiers,
        }
    }

    /// Render the binding for display: modifier glyphs in fixed order,
    /// then the key via the special-key symbol table, falling back to the
    /// raw token.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for modifier in &self.modifiers {
            out.push_str(modifier.glyph());
        }
        out.push_str(key_symbol(&self.primary_key));
        out
    }
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        let mut modifiers = BTreeSet::new();
        modifiers.insert(ModifierKey::Meta);
        modifiers.insert(ModifierKey::Shift);
        Self {
            primary_key: "Space".to_string(),
            modifiers,
        }
    }
}

/// Symbol table for special key tokens; unknown tokens render verbatim.
fn key_symbol(key: &str) -> &str {
    match key {
        "MetaLeft" | "MetaRight" => "\u{2318}",
        "ShiftLeft" | "ShiftRight" => "\u{21e7}",
        "AltLeft" | "AltRight" => "\u{2325}",
        "ControlLeft" | "ControlRight" => "\u{2303}",
        "Space" => "\u{2423}", // ␣
        other => other,
    }
}
