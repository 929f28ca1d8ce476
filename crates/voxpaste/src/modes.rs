//! Output modes: catalog, selection gating, and cleanup prompts.

use crate::{
    OverlayCoordinator, SessionHandle,
    platform::{OverlaySurface, SettingsStore, TextCleanup},
    store::lock_unpoisoned,
};

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

/// The always-available fallback mode.
pub const DEFAULT_MODE_ID: &str = "default";

/// One selectable output mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeDescriptor {
    /// Stable identifier, persisted as the selection key.
    pub id: &'static str,
    /// Menu label.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Whether the mode needs the cleanup capability to be useful.
    pub requires_cleanup: bool,
}

/// The fixed mode catalog. Every mode formats through cleanup; `default`
/// is special-cased by the selection gate because it degrades gracefully
/// to the raw transcript.
pub fn builtin_modes() -> Vec<ModeDescriptor> {
    vec![
        ModeDescriptor {
            id: DEFAULT_MODE_ID,
            display_name: "Default",
            description: "Clean up grammar and filler words",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "email",
            display_name: "Email",
            description: "Format as professional email",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "bullets",
            display_name: "Bullet Points",
            description: "Convert to organized bullet points",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "summary",
            display_name: "Summary",
            description: "Condense into a brief summary",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "slack",
            display_name: "Slack Message",
            description: "Short, casual chat message",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "meeting_notes",
            display_name: "Meeting Notes",
            description: "Structure with key points and action items",
            requires_cleanup: true,
        },
        ModeDescriptor {
            id: "code_comment",
            display_name: "Code Comment",
            description: "Format as code documentation",
            requires_cleanup: true,
        },
    ]
}

/// Cleanup system prompt for a mode. Every prompt pins the output to the
/// input language; the models drift into translation otherwise.
pub fn system_prompt(mode_id: &str, language_name: &str) -> String {
    let lang = language_name;
    match mode_id {
        "email" => format!(
            "You are a professional email formatter that NEVER translates. Format this \
             transcript as a professional email with an appropriate greeting, well-structured \
             body paragraphs, and a professional closing. Keep the EXACT SAME LANGUAGE as the \
             input ({lang}). NEVER change the language. Output ONLY the formatted email, \
             nothing else."
        ),
        "bullets" => format!(
            "You are a content organizer that NEVER translates. Convert this transcript into \
             clear, organized bullet points. Extract key points and use concise language. Keep \
             the EXACT SAME LANGUAGE as the input ({lang}). NEVER change the language. Output \
             ONLY the bullet list using \u{2022} or - markers, nothing else."
        ),
        "summary" => format!(
            "You are a summarizer that NEVER translates. Condense this transcript into a brief \
             summary capturing the main points. Be concise but comprehensive. Keep the EXACT \
             SAME LANGUAGE as the input ({lang}). NEVER change the language. Output ONLY the \
             summary, nothing else."
        ),
        "slack" => format!(
            "You are a chat message formatter that NEVER translates. Convert this transcript \
             into a short, casual message suitable for Slack or chat. Keep it friendly and \
             concise. Keep the EXACT SAME LANGUAGE as the input ({lang}). NEVER change the \
             language. Output ONLY the message, nothing else."
        ),
        "meeting_notes" => format!(
            "You are a meeting notes formatter that NEVER translates. Structure this transcript \
             as meeting notes with:\n- Key Discussion Points\n- Decisions Made\n- Action Items \
             (if any)\nKeep the EXACT SAME LANGUAGE as the input ({lang}). NEVER change the \
             language. Output ONLY the formatted notes, nothing else."
        ),
        "code_comment" => format!(
            "You are a code documentation formatter that NEVER translates. Format this \
             transcript as a code documentation comment. Use appropriate format (JSDoc, \
             docstring, etc. based on content). Be technical and precise. Keep the EXACT SAME \
             LANGUAGE as the input ({lang}). NEVER change the language. Output ONLY the \
             formatted comment, nothing else."
        ),
        _ => format!(
            "You are a transcript cleaner that NEVER translates. You clean up speech \
             transcripts by removing filler words and fixing grammar while keeping the EXACT \
             SAME LANGUAGE as the input. If input is {lang}, output {lang}. NEVER change the \
             language. Output ONLY the cleaned text."
        ),
    }
}

/// Cleanup user prompt for a mode.
pub fn user_prompt(mode_id: &str, language_name: &str, text: &str) -> String {
    let lang = language_name;
    let task = match mode_id {
        "email" => "Format this {l} transcript as a professional email (keep in {l})",
        "bullets" => "Convert this {l} transcript to bullet points (keep in {l})",
        "summary" => "Summarize this {l} transcript (keep in {l})",
        "slack" => "Convert this {l} transcript to a casual chat message (keep in {l})",
        "meeting_notes" => "Format this {l} transcript as meeting notes (keep in {l})",
        "code_comment" => "Format this {l} transcript as a code comment (keep in {l})",
        _ => "Clean this {l} transcript (keep in {l}, do NOT translate)",
    };
    format!("{}:\n\n{}", task.replace("{l}", lang), text)
}

/// Holds the mode catalog and arbitrates selection.
///
/// Selection of a cleanup-dependent, non-default mode is refused while the
/// cleanup capability is unavailable; an accepted selection is persisted,
/// then propagated to the session handle and the overlay, in that order.
pub struct ModeRegistry<C, O, S> {
    catalog: Vec<ModeDescriptor>,
    cleanup: Arc<AsyncMutex<C>>,
    overlay: OverlayCoordinator<O>,
    session: SessionHandle,
    store: Arc<Mutex<S>>,
}

impl<C, O, S> ModeRegistry<C, O, S>
where
    C: TextCleanup,
    O: OverlaySurface,
    S: SettingsStore,
{
    /// Build the registry with a persisted selection; an id that is no
    /// longer in the catalog falls back to the default mode.
    pub fn new(
        catalog: Vec<ModeDescriptor>,
        selected: &str,
        cleanup: Arc<AsyncMutex<C>>,
        overlay: OverlayCoordinator<O>,
        session: SessionHandle,
        store: Arc<Mutex<S>>,
    ) -> Self {
        let active = if catalog.iter().any(|m| m.id == selected) {
            selected
        } else {
            DEFAULT_MODE_ID
        };
        session.set_active_mode(active);

        Self {
            catalog,
            cleanup,
            overlay,
            session,
            store,
        }
    }

    /// The currently active mode id.
    pub fn active_mode_id(&self) -> String {
        self.session.active_mode_id()
    }

    /// Attempt to select a mode. Returns whether the selection was
    /// accepted; a rejected selection leaves the active mode unchanged.
    #[instrument(skip(self))]
    pub async fn select_mode(&self, mode_id: &str) -> bool {
        let Some(descriptor) = self.catalog.iter().find(|m| m.id == mode_id) else {
            warn!(mode_id, "Unknown mode");
            return false;
        };

        if descriptor.requires_cleanup && descriptor.id != DEFAULT_MODE_ID {
            let available = self.cleanup.lock().await.is_available();
            if !available {
                info!(mode_id, "Mode requires cleanup capability, which is unavailable");
                return false;
            }
        }

        if let Err(e) = lock_unpoisoned(&self.store).save_selected_mode(mode_id) {
            warn!(error = ?e, "Failed to persist mode selection");
        }

        self.session.set_active_mode(mode_id);
        if let Err(e) = self.overlay.set_mode(mode_id).await {
            warn!(error = ?e, "Failed to propagate mode to overlay");
        }

        info!(mode_id, "Mode selected");
        true
    }
}
