//! Per-category unlocked level state.
//!
//! Levels start at 1, live in [1,10], and only ever increase. The store
//! persists synchronously under the `userLevels` key; a corrupt or
//! unreadable payload degrades to the all-level-1 default with a warning.

use crate::store::KeyValue;
use crate::types::{CategoryId, MAX_LEVEL};
use crate::Result;
use std::collections::HashMap;

/// Persisted key for unlocked levels
pub const LEVELS_KEY: &str = "userLevels";

/// Durable mapping from category to unlocked level
pub struct LevelStore<S: KeyValue> {
    store: S,
    levels: HashMap<CategoryId, u8>,
}

impl<S: KeyValue> LevelStore<S> {
    /// Load persisted levels, falling back to level 1 everywhere
    pub fn load(store: S) -> Self {
        let levels = match store.get(LEVELS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<HashMap<CategoryId, u8>>(&raw) {
                Ok(parsed) => parsed
                    .into_iter()
                    .map(|(cat, lvl)| (cat, lvl.clamp(1, MAX_LEVEL)))
                    .collect(),
                Err(e) => {
                    tracing::warn!("Failed to parse stored levels: {}. Using defaults.", e);
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read stored levels: {}. Using defaults.", e);
                HashMap::new()
            }
        };

        Self { store, levels }
    }

    /// Unlocked level for a category; 1 if never set
    pub fn get(&self, category: CategoryId) -> u8 {
        self.levels.get(&category).copied().unwrap_or(1)
    }

    /// Raise a category's unlocked level, persisting synchronously.
    ///
    /// Clamps to [1,10] and ignores decreases: callers never legitimately
    /// lower a level, so the store enforces monotonicity itself.
    pub fn set(&mut self, category: CategoryId, level: u8) -> Result<()> {
        let level = level.clamp(1, MAX_LEVEL);
        let current = self.get(category);
        if self.levels.contains_key(&category) && level <= current {
            tracing::debug!(
                "Ignoring level write for {}: {} <= current {}",
                category,
                level,
                current
            );
            return Ok(());
        }

        self.levels.insert(category, level);
        self.persist()
    }

    /// Snapshot of all categories, defaulted to 1 where unset
    pub fn all(&self) -> HashMap<CategoryId, u8> {
        CategoryId::ALL
            .iter()
            .map(|&cat| (cat, self.get(cat)))
            .collect()
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.levels)?;
        self.store.set(LEVELS_KEY, &raw)?;
        tracing::debug!("Persisted unlocked levels");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults_to_level_one() {
        let levels = LevelStore::load(MemoryStore::new());
        for cat in CategoryId::ALL {
            assert_eq!(levels.get(cat), 1);
        }
    }

    #[test]
    fn test_set_persists_and_reads_back() {
        let mut levels = LevelStore::load(MemoryStore::new());
        levels.set(CategoryId::Push, 4).unwrap();
        assert_eq!(levels.get(CategoryId::Push), 4);

        // Reload from the same backing payload
        let raw = serde_json::to_string(&levels.levels).unwrap();
        let reloaded = LevelStore::load(MemoryStore::new().with(LEVELS_KEY, &raw));
        assert_eq!(reloaded.get(CategoryId::Push), 4);
        assert_eq!(reloaded.get(CategoryId::Pull), 1);
    }

    #[test]
    fn test_levels_are_monotonic() {
        let mut levels = LevelStore::load(MemoryStore::new());
        levels.set(CategoryId::Legs, 5).unwrap();
        levels.set(CategoryId::Legs, 3).unwrap();
        assert_eq!(levels.get(CategoryId::Legs), 5);
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut levels = LevelStore::load(MemoryStore::new());
        levels.set(CategoryId::Core, 99).unwrap();
        assert_eq!(levels.get(CategoryId::Core), MAX_LEVEL);
    }

    #[test]
    fn test_corrupt_payload_degrades_to_default() {
        let store = MemoryStore::new().with(LEVELS_KEY, "{ not json }");
        let levels = LevelStore::load(store);
        assert_eq!(levels.get(CategoryId::Push), 1);
    }

    #[test]
    fn test_out_of_range_stored_values_clamped_on_load() {
        let store = MemoryStore::new().with(LEVELS_KEY, r#"{"dips":14}"#);
        let levels = LevelStore::load(store);
        assert_eq!(levels.get(CategoryId::Dips), MAX_LEVEL);
    }
}
