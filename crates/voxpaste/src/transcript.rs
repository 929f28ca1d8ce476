//! Transcript records and per-process session statistics.

use serde::{Deserialize, Serialize};

/// One completed dictation run. Immutable once built; stored front-first
/// in the history list and persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Whisper output, whitespace-trimmed.
    pub raw_text: String,
    /// Cleanup output, or a copy of `raw_text` when cleanup was skipped,
    /// failed, or produced a refusal-shaped reply.
    pub cleaned_text: String,
    /// Detected language code.
    pub language: String,
    /// Output mode active when the run completed.
    pub mode_id: String,
    /// Completion time, milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
}

impl TranscriptRecord {
    /// The text the run delivered: cleaned when present, raw otherwise.
    pub fn final_text(&self) -> &str {
        if self.cleaned_text.is_empty() {
            &self.raw_text
        } else {
            &self.cleaned_text
        }
    }
}

/// Process-lifetime dictation counters. Not persisted; a restart begins
/// a fresh count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    /// Runs completed since the process started today.
    pub completed_today: u32,
    /// Whitespace-token count across all delivered texts.
    pub cumulative_word_count: u64,
    /// Consecutive active days. Without persisted per-day state this is
    /// 0 until the first completed run, then 1.
    pub streak_days: u32,
}

impl SessionStatistics {
    /// Record one completed pipeline run delivering `text`.
    pub fn record_completion(&mut self, text: &str) {
        self.completed_today += 1;
        self.cumulative_word_count += text.split_whitespace().count() as u64;
        if self.streak_days == 0 {
            self.streak_days = 1;
        }
    }
}

/// Whether a cleanup reply looks like a refusal or placeholder rather
/// than a cleaned transcript ("Please provide the transcript…"). The
/// pipeline keeps the raw text when this matches.
pub fn looks_like_cleanup_refusal(reply: &str) -> bool {
    reply.contains("provide") && reply.contains("transcript")
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
