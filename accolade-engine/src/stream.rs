//! Activity feed over award events.

use accolade_core::{
    AccoladeResult, AchievementDefinition, AwardEvent, EngineConfig, GameTitleKey, StreamItem,
    StreamPage,
};
use accolade_storage::{AchievementStore, AwardFilter, CacheEntry, DefinitionCache, Page};
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters for [`StreamAggregator::stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub game_title_key: GameTitleKey,
    pub player_id: Option<String>,
    pub friend_ids: Vec<String>,
    /// Collapse events into one item per player.
    pub group: bool,
    /// 1-based; `None` or 0 is the first page.
    pub page: Option<u32>,
    /// `None` or 0 uses the configured default.
    pub per_page: Option<u32>,
}

impl StreamQuery {
    pub fn new(game_title_key: impl Into<GameTitleKey>) -> Self {
        Self {
            game_title_key: game_title_key.into(),
            player_id: None,
            friend_ids: Vec::new(),
            group: false,
            page: None,
            per_page: None,
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

    pub fn grouped(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Player ids the feed is restricted to, or `None` for the whole title.
    fn player_scope(&self) -> Option<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        let candidates = self.player_id.iter().chain(self.friend_ids.iter());
        for id in candidates {
            if !id.trim().is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        (!ids.is_empty()).then_some(ids)
    }
}

struct GroupBuilder {
    player_id: String,
    player_name: String,
    awards: u64,
    achievements: Vec<AchievementDefinition>,
}

impl GroupBuilder {
    fn into_item(self) -> StreamItem {
        StreamItem::Group {
            player_id: self.player_id,
            player_name: self.player_name,
            awards: self.awards,
            achievements: self.achievements,
        }
    }
}

/// Builds the most-recent-first activity feed for a title.
pub struct StreamAggregator<S: AchievementStore + 'static> {
    store: Arc<S>,
    cache: DefinitionCache<S>,
    config: EngineConfig,
}

impl<S: AchievementStore + 'static> StreamAggregator<S> {
    pub fn new(store: Arc<S>, cache: DefinitionCache<S>, config: EngineConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// One page of the feed plus the size of the whole matching set.
    ///
    /// Ungrouped, every event is an item and `total_count` counts events.
    /// Grouped, items are players in order of their most recent event and
    /// `total_count` counts players.
    pub async fn stream(&self, query: &StreamQuery) -> AccoladeResult<StreamPage> {
        let entry = match self.cache.entry(&query.game_title_key)? {
            Some(entry) if !entry.is_empty() => entry,
            _ => return Ok(StreamPage::default()),
        };

        let per_page = self.config.effective_per_page(query.per_page);
        let page = Page::new(query.page.unwrap_or(1), per_page);

        let names: Vec<String> = entry.definitions().iter().map(|d| d.name.clone()).collect();
        let mut filter =
            AwardFilter::for_title(query.game_title_key.clone()).achievements_in(names);
        if let Some(ids) = query.player_scope() {
            filter = filter.players_in(ids);
        }

        if query.group {
            let (events, _) = self.store.find_award_events(&filter, None).await?;
            let groups = group_by_player(&entry, events);
            let total_count = groups.len() as u64;
            let items = page
                .apply(groups)
                .into_iter()
                .map(GroupBuilder::into_item)
                .collect();
            Ok(StreamPage { items, total_count })
        } else {
            let (events, total_count) = self.store.find_award_events(&filter, Some(page)).await?;
            let items = events
                .into_iter()
                .filter_map(|event| {
                    entry
                        .find(&event.achievement_name)
                        .map(|definition| StreamItem::Award {
                            player_name: event.player_name,
                            awarded: definition.clone(),
                        })
                })
                .collect();
            Ok(StreamPage { items, total_count })
        }
    }
}

/// Collapse most-recent-first events into per-player groups, keeping the
/// order in which players first appear.
fn group_by_player(entry: &CacheEntry, events: Vec<AwardEvent>) -> Vec<GroupBuilder> {
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let Some(definition) = entry.find(&event.achievement_name) else {
            continue;
        };
        let slot = *index.entry(event.player_id.clone()).or_insert_with(|| {
            groups.push(GroupBuilder {
                player_id: event.player_id.clone(),
                player_name: event.player_name.clone(),
                awards: 0,
                achievements: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.awards += 1;
        if !group.achievements.iter().any(|d| d.name == definition.name) {
            group.achievements.push(definition.clone());
        }
    }

    groups
}
