//! Async store adapter trait.
//!
//! The engine never issues raw queries; everything it needs from persistence
//! goes through this trait so backends can be swapped without touching the
//! award or aggregation logic.

use accolade_core::{
    AccoladeResult, AchievementDefinition, AwardEvent, DuplicatePolicy, GameTitleKey,
    NewAwardEvent,
};
use async_trait::async_trait;

/// Async store adapter for definitions and award events.
///
/// Implementations must guarantee read-after-write visibility for
/// sequential calls from the same caller.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    // ========================================================================
    // DEFINITION OPERATIONS
    // ========================================================================

    /// Insert or replace a definition keyed by (game title, name).
    async fn upsert_definition(&self, definition: &AchievementDefinition) -> AccoladeResult<()>;

    /// All definitions for one game title.
    async fn find_definitions(
        &self,
        game_title_key: &GameTitleKey,
    ) -> AccoladeResult<Vec<AchievementDefinition>>;

    /// All definitions across every game title, for full cache reloads.
    async fn find_all_definitions(&self) -> AccoladeResult<Vec<AchievementDefinition>>;

    // ========================================================================
    // AWARD OPERATIONS
    // ========================================================================

    /// Earliest award event for (title, achievement, player), if any.
    async fn find_award_event(
        &self,
        game_title_key: &GameTitleKey,
        achievement_name: &str,
        player_id: &str,
    ) -> AccoladeResult<Option<AwardEvent>>;

    /// Conditionally insert an award event.
    ///
    /// The existence check and the insert MUST be atomic with respect to
    /// other calls for the same (title, achievement, player): under
    /// [`DuplicatePolicy::Unique`] two concurrent calls can never both
    /// create a row.
    async fn insert_award_event(
        &self,
        event: NewAwardEvent,
        policy: DuplicatePolicy,
    ) -> AccoladeResult<InsertOutcome>;

    /// Award events matching `filter`, most recent first, with the total
    /// size of the matching set regardless of `page`.
    ///
    /// Events sharing a `created_at` keep their insertion order.
    async fn find_award_events(
        &self,
        filter: &AwardFilter,
        page: Option<Page>,
    ) -> AccoladeResult<(Vec<AwardEvent>, u64)>;

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Delete every definition and award event of a game title.
    ///
    /// Returns the number of records removed.
    async fn purge_game_title(&self, game_title_key: &GameTitleKey) -> AccoladeResult<u64>;

    /// Check if the storage backend is healthy.
    async fn health_check(&self) -> AccoladeResult<bool>;
}

/// Result of a conditional award insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// No prior event existed; this is the first.
    Created(AwardEvent),
    /// A prior event existed and duplicates were allowed.
    Duplicated(AwardEvent),
    /// A prior event existed and nothing was written.
    Rejected { existing: AwardEvent },
}

impl InsertOutcome {
    /// The newly written event, if any.
    pub fn inserted(&self) -> Option<&AwardEvent> {
        match self {
            Self::Created(event) | Self::Duplicated(event) => Some(event),
            Self::Rejected { .. } => None,
        }
    }
}

/// Filter over award events. All present criteria must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardFilter {
    pub game_title_key: GameTitleKey,
    pub achievement_name: Option<String>,
    pub achievement_names: Option<Vec<String>>,
    pub player_id: Option<String>,
    pub player_id_in: Option<Vec<String>>,
}

impl AwardFilter {
    pub fn for_title(game_title_key: GameTitleKey) -> Self {
        Self {
            game_title_key,
            achievement_name: None,
            achievement_names: None,
            player_id: None,
            player_id_in: None,
        }
    }

    pub fn achievement(mut self, name: impl Into<String>) -> Self {
        self.achievement_name = Some(name.into());
        self
    }

    pub fn achievements_in(mut self, names: Vec<String>) -> Self {
        self.achievement_names = Some(names);
        self
    }

    pub fn player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn players_in(mut self, player_ids: Vec<String>) -> Self {
        self.player_id_in = Some(player_ids);
        self
    }

    /// Evaluate the filter against one event.
    pub fn matches(&self, event: &AwardEvent) -> bool {
        if event.game_title_key != self.game_title_key {
            return false;
        }
        if let Some(name) = &self.achievement_name {
            if &event.achievement_name != name {
                return false;
            }
        }
        if let Some(names) = &self.achievement_names {
            if !names.iter().any(|n| n == &event.achievement_name) {
                return false;
            }
        }
        if let Some(player_id) = &self.player_id {
            if &event.player_id != player_id {
                return false;
            }
        }
        if let Some(ids) = &self.player_id_in {
            if !ids.iter().any(|id| id == &event.player_id) {
                return false;
            }
        }
        true
    }
}

/// One-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    /// Build a page, treating page number 0 as the first page.
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: number.max(1),
            per_page,
        }
    }

    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> usize {
        (self.number.max(1) as usize - 1).saturating_mul(self.per_page as usize)
    }

    /// Slice an already-ordered sequence down to this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect()
    }
}
