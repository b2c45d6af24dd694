//! Award persistence under the duplicate-award policy.

use crate::validator::ValidatedAward;
use accolade_core::{AccoladeResult, AwardEvent, Clock, ErrorCode};
use accolade_storage::{AchievementStore, InsertOutcome};
use serde::Serialize;
use std::sync::Arc;

/// What a save did. None of these are errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SaveOutcome {
    /// First award of this achievement to this player.
    Saved(AwardEvent),
    /// The player already had it and duplicates were not allowed.
    AlreadyHadNotSaved { existing: AwardEvent },
    /// The player already had it and another event was recorded.
    AlreadyHadSaved(AwardEvent),
}

impl SaveOutcome {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Saved(_) => ErrorCode::NoError,
            Self::AlreadyHadNotSaved { .. } => ErrorCode::AlreadyHadAchievementNotSaved,
            Self::AlreadyHadSaved(_) => ErrorCode::AlreadyHadAchievementSaved,
        }
    }

    /// The event written by this save, if any.
    pub fn saved_event(&self) -> Option<&AwardEvent> {
        match self {
            Self::Saved(event) | Self::AlreadyHadSaved(event) => Some(event),
            Self::AlreadyHadNotSaved { .. } => None,
        }
    }

    pub fn was_saved(&self) -> bool {
        self.saved_event().is_some()
    }
}

impl From<InsertOutcome> for SaveOutcome {
    fn from(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Created(event) => Self::Saved(event),
            InsertOutcome::Duplicated(event) => Self::AlreadyHadSaved(event),
            InsertOutcome::Rejected { existing } => Self::AlreadyHadNotSaved { existing },
        }
    }
}

/// Writes validated awards through the store's atomic conditional insert.
pub struct AwardWriter<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: AchievementStore> AwardWriter<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Persist at most one award event.
    ///
    /// `created_at` comes from the injected clock; `fields` are stored as given.
    pub async fn save(&self, award: ValidatedAward) -> AccoladeResult<SaveOutcome> {
        let (event, policy) = award.into_new_event(self.clock.now());
        let game_title_key = event.game_title_key.clone();
        let player_id = event.player_id.clone();
        let achievement_name = event.achievement_name.clone();

        let outcome = SaveOutcome::from(self.store.insert_award_event(event, policy).await?);

        tracing::debug!(
            game_title_key = %game_title_key,
            achievement = %achievement_name,
            player_id = %player_id,
            policy = ?policy,
            code = outcome.code().as_u16(),
            "Award save completed"
        );

        Ok(outcome)
    }
}
