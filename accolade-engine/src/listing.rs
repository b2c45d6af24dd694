//! Definition listing decorated with player and friend awards.

use accolade_core::{AccoladeResult, AwardEvent, DecoratedDefinition, GameTitleKey};
use accolade_storage::{AchievementStore, AwardFilter, DefinitionCache};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Parameters for [`ListingAggregator::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub game_title_key: GameTitleKey,
    pub player_id: Option<String>,
    pub friend_ids: Vec<String>,
}

impl ListQuery {
    pub fn new(game_title_key: impl Into<GameTitleKey>) -> Self {
        Self {
            game_title_key: game_title_key.into(),
            player_id: None,
            friend_ids: Vec::new(),
        }
    }

    pub fn player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn friends<I, T>(mut self, friend_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.friend_ids = friend_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Lists a title's definitions, each optionally decorated with the
/// requesting player's award and the awards of their friends.
pub struct ListingAggregator<S: AchievementStore + 'static> {
    store: Arc<S>,
    cache: DefinitionCache<S>,
}

impl<S: AchievementStore + 'static> ListingAggregator<S> {
    pub fn new(store: Arc<S>, cache: DefinitionCache<S>) -> Self {
        Self { store, cache }
    }

    /// Definitions in name order.
    ///
    /// `player` is the player's earliest award of the definition. `friends`
    /// holds every friend award of it, earliest first. Either decoration is
    /// `None` when nothing matches. Award events are read from the store on
    /// every call so a save is visible immediately.
    pub async fn list(&self, query: &ListQuery) -> AccoladeResult<Vec<DecoratedDefinition>> {
        let definitions = self.cache.get(&query.game_title_key)?;

        let player_id = query
            .player_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());
        let friend_ids: HashSet<&str> = query
            .friend_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
            .collect();

        if definitions.is_empty() || (player_id.is_none() && friend_ids.is_empty()) {
            return Ok(definitions
                .iter()
                .cloned()
                .map(DecoratedDefinition::bare)
                .collect());
        }

        let mut wanted: Vec<String> = friend_ids.iter().map(|id| id.to_string()).collect();
        if let Some(id) = player_id {
            if !friend_ids.contains(id) {
                wanted.push(id.to_string());
            }
        }
        let filter = AwardFilter::for_title(query.game_title_key.clone()).players_in(wanted);
        let (events, _) = self.store.find_award_events(&filter, None).await?;

        let mut by_achievement: HashMap<&str, Vec<&AwardEvent>> = HashMap::new();
        for event in &events {
            by_achievement
                .entry(event.achievement_name.as_str())
                .or_default()
                .push(event);
        }

        let decorated = definitions
            .iter()
            .map(|definition| {
                let awarded = by_achievement
                    .get(definition.name.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let player = player_id.and_then(|id| {
                    awarded
                        .iter()
                        .filter(|e| e.player_id == id)
                        .min_by_key(|e| e.recency_key())
                        .map(|e| (*e).clone())
                });

                let mut friends: Vec<AwardEvent> = awarded
                    .iter()
                    .filter(|e| friend_ids.contains(e.player_id.as_str()))
                    .map(|e| (*e).clone())
                    .collect();
                friends.sort_by_key(AwardEvent::recency_key);

                DecoratedDefinition {
                    definition: definition.clone(),
                    player,
                    friends: (!friends.is_empty()).then_some(friends),
                }
            })
            .collect();

        Ok(decorated)
    }
}
