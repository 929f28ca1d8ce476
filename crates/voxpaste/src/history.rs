//! Bounded, persisted transcript history.

use crate::{TranscriptRecord, platform::SettingsStore, store::lock_unpoisoned};

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Maximum number of transcripts kept in history.
pub const HISTORY_CAPACITY: usize = 10;

/// Front-first transcript history, capped at [`HISTORY_CAPACITY`] and
/// persisted in full on every push.
pub struct HistoryStore<S> {
    entries: Vec<TranscriptRecord>,
    store: Arc<Mutex<S>>,
    rehydrated: bool,
}

impl<S: SettingsStore> HistoryStore<S> {
    /// Load persisted history; an unreadable store starts empty.
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        let entries = match lock_unpoisoned(&store).load_history() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = ?e, "Failed to load history, starting empty");
                Vec::new()
            }
        };

        debug!(count = entries.len(), "History loaded");

        Self {
            entries,
            store,
            rehydrated: false,
        }
    }

    /// Prepend a record, evict beyond capacity, persist the full list.
    ///
    /// Persistence is skipped for an empty list so a cold start can never
    /// overwrite a previous run's saved history with nothing.
    pub fn push(&mut self, record: TranscriptRecord) {
        self.entries.insert(0, record);
        self.entries.truncate(HISTORY_CAPACITY);

        if self.entries.is_empty() {
            return;
        }
        if let Err(e) = lock_unpoisoned(&self.store).save_history(&self.entries) {
            warn!(error = ?e, "Failed to persist history");
        }
    }

    /// Records, most recent first.
    pub fn entries(&self) -> &[TranscriptRecord] {
        &self.entries
    }

    /// Surface the most recent persisted record exactly once, for seeding
    /// the displayed result after a restart. Subsequent calls return
    /// `None` so re-renders never overwrite a newer result.
    pub fn take_rehydration(&mut self) -> Option<TranscriptRecord> {
        if self.rehydrated {
            return None;
        }
        self.rehydrated = true;
        self.entries.first().cloned()
    }
}
