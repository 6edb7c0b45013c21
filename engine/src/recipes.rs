//! Memoized combination rules.

use std::collections::HashMap;

use aether_types::{KindId, RecipeKey};

use crate::seed;

/// Maps an unordered pair of kinds to the kind they produce.
///
/// Only successful combinations are stored. A key, once written, is never
/// overwritten, so concurrent discoveries of the same pair converge on the
/// first answer.
#[derive(Debug, Clone, Default)]
pub struct RecipeStore {
    entries: HashMap<RecipeKey, KindId>,
}

impl RecipeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seeded() -> Self {
        Self {
            entries: seed::recipes().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &RecipeKey) -> Option<&KindId> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &RecipeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Record `key -> result` unless the key already has a result.
    ///
    /// Returns the result now stored under `key`, which is the existing one
    /// when the write lost.
    pub fn put_if_absent(&mut self, key: RecipeKey, result: KindId) -> &KindId {
        self.entries.entry(key).or_insert(result)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All recipes, sorted by key.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&RecipeKey, &KindId)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
