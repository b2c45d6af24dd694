//! In-memory store for tests and development.
//!
//! Definitions and awards live behind `RwLock`s. The award table keeps one
//! write lock across the duplicate check and the insert, which plays the
//! role a unique index plays in a real database.

use crate::store::{AchievementStore, AwardFilter, InsertOutcome, Page};
use accolade_core::{
    AccoladeResult, AchievementDefinition, AwardEvent, DuplicatePolicy, GameTitleKey,
    NewAwardEvent, StorageError,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

type DefinitionKey = (GameTitleKey, String);

#[derive(Debug, Default)]
struct AwardTable {
    /// Insertion order.
    events: Vec<AwardEvent>,
    next_sequence: u64,
}

/// In-memory [`AchievementStore`].
///
/// Clones share the same underlying tables.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    definitions: Arc<RwLock<BTreeMap<DefinitionKey, AchievementDefinition>>>,
    awards: Arc<RwLock<AwardTable>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every operation fails with
    /// [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Get count of stored award events.
    pub fn award_count(&self) -> AccoladeResult<usize> {
        let awards = self.awards.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(awards.events.len())
    }

    /// Get count of stored definitions.
    pub fn definition_count(&self) -> AccoladeResult<usize> {
        let definitions = self
            .definitions
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(definitions.len())
    }

    fn ensure_online(&self) -> AccoladeResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "store is offline".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl AchievementStore for InMemoryStore {
    async fn upsert_definition(&self, definition: &AchievementDefinition) -> AccoladeResult<()> {
        self.ensure_online()?;
        let mut definitions = self
            .definitions
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        definitions.insert(
            (definition.game_title_key.clone(), definition.name.clone()),
            definition.clone(),
        );
        Ok(())
    }

    async fn find_definitions(
        &self,
        game_title_key: &GameTitleKey,
    ) -> AccoladeResult<Vec<AchievementDefinition>> {
        self.ensure_online()?;
        let definitions = self
            .definitions
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(definitions
            .values()
            .filter(|d| &d.game_title_key == game_title_key)
            .cloned()
            .collect())
    }

    async fn find_all_definitions(&self) -> AccoladeResult<Vec<AchievementDefinition>> {
        self.ensure_online()?;
        let definitions = self
            .definitions
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(definitions.values().cloned().collect())
    }

    async fn find_award_event(
        &self,
        game_title_key: &GameTitleKey,
        achievement_name: &str,
        player_id: &str,
    ) -> AccoladeResult<Option<AwardEvent>> {
        self.ensure_online()?;
        let awards = self.awards.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(awards
            .events
            .iter()
            .filter(|e| {
                &e.game_title_key == game_title_key
                    && e.achievement_name == achievement_name
                    && e.player_id == player_id
            })
            .min_by_key(|e| e.recency_key())
            .cloned())
    }

    async fn insert_award_event(
        &self,
        event: NewAwardEvent,
        policy: DuplicatePolicy,
    ) -> AccoladeResult<InsertOutcome> {
        self.ensure_online()?;
        // Held across check and insert.
        let mut awards = self.awards.write().map_err(|_| StorageError::LockPoisoned)?;

        let existing = awards
            .events
            .iter()
            .filter(|e| {
                e.game_title_key == event.game_title_key
                    && e.achievement_name == event.achievement_name
                    && e.player_id == event.player_id
            })
            .min_by_key(|e| e.recency_key())
            .cloned();

        if let (Some(existing), DuplicatePolicy::Unique) = (&existing, policy) {
            return Ok(InsertOutcome::Rejected {
                existing: existing.clone(),
            });
        }

        let sequence = awards.next_sequence;
        awards.next_sequence += 1;
        let stored = event.into_event(sequence);
        awards.events.push(stored.clone());

        Ok(match existing {
            None => InsertOutcome::Created(stored),
            Some(_) => InsertOutcome::Duplicated(stored),
        })
    }

    async fn find_award_events(
        &self,
        filter: &AwardFilter,
        page: Option<Page>,
    ) -> AccoladeResult<(Vec<AwardEvent>, u64)> {
        self.ensure_online()?;
        let awards = self.awards.read().map_err(|_| StorageError::LockPoisoned)?;

        let mut matching: Vec<AwardEvent> = awards
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        drop(awards);

        // Stable sort: equal timestamps keep insertion order.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let events = match page {
            Some(page) => page.apply(matching),
            None => matching,
        };
        Ok((events, total))
    }

    async fn purge_game_title(&self, game_title_key: &GameTitleKey) -> AccoladeResult<u64> {
        self.ensure_online()?;
        let mut removed = 0u64;

        {
            let mut definitions = self
                .definitions
                .write()
                .map_err(|_| StorageError::LockPoisoned)?;
            let before = definitions.len();
            definitions.retain(|(key, _), _| key != game_title_key);
            removed += (before - definitions.len()) as u64;
        }

        let mut awards = self.awards.write().map_err(|_| StorageError::LockPoisoned)?;
        let before = awards.events.len();
        awards.events.retain(|e| &e.game_title_key != game_title_key);
        removed += (before - awards.events.len()) as u64;

        Ok(removed)
    }

    async fn health_check(&self) -> AccoladeResult<bool> {
        Ok(!self.offline.load(Ordering::SeqCst))
    }
}

// ============================================================================
// TESTS
// ============================================================================
