//! Per-title cache entries.

use accolade_core::{AchievementDefinition, Timestamp};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Immutable snapshot of one game title's definitions.
///
/// Entries are never edited in place: a refresh builds a new entry and
/// swaps the `Arc`, so a reader holding an entry always sees a complete set.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Sorted by name, byte-wise ascending.
    definitions: Arc<[AchievementDefinition]>,
    /// False once a refresh was requested or failed for this title.
    fresh: bool,
    /// When the definitions were fetched from the store.
    loaded_at: Timestamp,
}

impl CacheEntry {
    /// Build a fresh entry, sorting the definitions into their stable order.
    pub fn new(mut definitions: Vec<AchievementDefinition>) -> Self {
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            definitions: definitions.into(),
            fresh: true,
            loaded_at: Utc::now(),
        }
    }

    /// Copy of this entry flagged as stale. Shares the definition slice.
    pub fn to_stale(&self) -> Self {
        Self {
            definitions: Arc::clone(&self.definitions),
            fresh: false,
            loaded_at: self.loaded_at,
        }
    }

    pub fn definitions(&self) -> Arc<[AchievementDefinition]> {
        Arc::clone(&self.definitions)
    }

    /// Look up a definition by name.
    pub fn find(&self, name: &str) -> Option<&AchievementDefinition> {
        self.definitions
            .binary_search_by(|d| d.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.definitions[idx])
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// How long ago the definitions were fetched.
    pub fn staleness(&self) -> Duration {
        (Utc::now() - self.loaded_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
