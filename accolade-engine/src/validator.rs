//! Award request validation.

use accolade_core::{
    AccoladeResult, AchievementDefinition, AwardRequest, DuplicatePolicy, GameTitleKey,
    NewAwardEvent, Timestamp, ValidationError,
};
use accolade_storage::{AchievementStore, DefinitionCache};

/// An award request that passed every check.
///
/// Only [`AwardValidator::validate`] can produce one, so anything holding a
/// `ValidatedAward` refers to a real definition with the right secret.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAward {
    definition: AchievementDefinition,
    player_id: String,
    player_name: String,
    fields: Option<serde_json::Value>,
    policy: DuplicatePolicy,
}

impl ValidatedAward {
    pub fn definition(&self) -> &AchievementDefinition {
        &self.definition
    }

    pub fn game_title_key(&self) -> &GameTitleKey {
        &self.definition.game_title_key
    }

    pub fn achievement_name(&self) -> &str {
        &self.definition.name
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Turn into the event payload the store persists.
    pub(crate) fn into_new_event(self, created_at: Timestamp) -> (NewAwardEvent, DuplicatePolicy) {
        let event = NewAwardEvent {
            game_title_key: self.definition.game_title_key,
            achievement_name: self.definition.name,
            player_id: self.player_id,
            player_name: self.player_name,
            fields: self.fields,
            created_at,
        };
        (event, self.policy)
    }
}

/// Checks award requests against the cached definitions.
///
/// Checks run in a fixed order and the first failure wins:
/// achievement name, player id, player name, then the
/// (title, name, secret) match. Validation never writes anything.
pub struct AwardValidator<S: AchievementStore + 'static> {
    cache: DefinitionCache<S>,
}

impl<S: AchievementStore + 'static> AwardValidator<S> {
    pub fn new(cache: DefinitionCache<S>) -> Self {
        Self { cache }
    }

    pub fn validate(&self, request: AwardRequest) -> AccoladeResult<ValidatedAward> {
        let achievement_name =
            present(request.achievement_name).ok_or(ValidationError::NoAchievement)?;
        let player_id = present(request.player_id).ok_or(ValidationError::NoPlayerId)?;
        let player_name = present(request.player_name).ok_or(ValidationError::NoPlayerName)?;

        let game_title_key = request
            .game_title_key
            .filter(|key| !key.is_blank())
            .unwrap_or_else(|| GameTitleKey::new(""));
        let invalid = |game_title_key: GameTitleKey, achievement_name: String| {
            ValidationError::InvalidAchievement {
                game_title_key,
                achievement_name,
            }
        };

        let secret = match present(request.achievement_secret_key) {
            Some(secret) if !game_title_key.is_blank() => secret,
            _ => return Err(invalid(game_title_key, achievement_name).into()),
        };

        let definition = match self.cache.find(&game_title_key, &achievement_name)? {
            Some(definition) if definition.matches_secret(&secret) => definition,
            _ => return Err(invalid(game_title_key, achievement_name).into()),
        };

        Ok(ValidatedAward {
            definition,
            player_id,
            player_name,
            fields: request.fields,
            policy: DuplicatePolicy::from_allow_duplicates(
                request.allow_duplicates.unwrap_or(false),
            ),
        })
    }
}

/// Empty and whitespace-only strings count as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
