//! Capped, append-only workout history.
//!
//! Completed movement entries are kept newest-first under the
//! `workoutHistory` key, truncated to the 20 most recent. Corrupt or
//! unreadable persisted history degrades to empty with a warning.

use crate::store::KeyValue;
use crate::types::WorkoutEntry;
use crate::Result;

/// Persisted key for the workout history
pub const HISTORY_KEY: &str = "workoutHistory";

/// Maximum number of retained entries; the oldest is dropped on overflow
pub const HISTORY_CAP: usize = 20;

/// Durable, capped log of completed movements
pub struct HistoryStore<S: KeyValue> {
    store: S,
    entries: Vec<WorkoutEntry>,
}

impl<S: KeyValue> HistoryStore<S> {
    /// Load persisted history, falling back to empty
    pub fn load(store: S) -> Self {
        let entries = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<WorkoutEntry>>(&raw) {
                Ok(mut parsed) => {
                    parsed.truncate(HISTORY_CAP);
                    parsed
                }
                Err(e) => {
                    tracing::warn!("Failed to parse workout history: {}. Starting empty.", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read workout history: {}. Starting empty.", e);
                Vec::new()
            }
        };

        Self { store, entries }
    }

    /// Prepend an entry, truncate to the cap, persist
    pub fn append(&mut self, entry: WorkoutEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);

        let raw = serde_json::to_string(&self.entries)?;
        self.store.set(HISTORY_KEY, &raw)?;
        tracing::debug!("Persisted workout history ({} entries)", self.entries.len());
        Ok(())
    }

    /// All entries, newest first
    pub fn all(&self) -> &[WorkoutEntry] {
        &self.entries
    }

    /// The `n` most recent entries, newest first
    pub fn recent(&self, n: usize) -> &[WorkoutEntry] {
        &self.entries[..self.entries.len().min(n)]
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
