//! Core entity structures

use crate::{new_award_id, AwardId, GameTitleKey, Timestamp};
use serde::{Deserialize, Serialize};

/// Achievement definition - the template a game title registers.
///
/// `(game_title_key, name)` is unique. The secret key gates awarding and is
/// never serialized into read results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub game_title_key: GameTitleKey,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub secret_key: String,
    pub created_at: Timestamp,
}

impl AchievementDefinition {
    pub fn new(
        game_title_key: GameTitleKey,
        name: impl Into<String>,
        secret_key: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            game_title_key,
            name: name.into(),
            secret_key: secret_key.into(),
            created_at,
        }
    }

    /// Check whether a caller-supplied secret unlocks this definition.
    pub fn matches_secret(&self, secret: &str) -> bool {
        self.secret_key == secret
    }
}

/// One persisted instance of a player earning one achievement.
///
/// Events are immutable once written. `sequence` is assigned by the store
/// and breaks ties between events sharing a `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardEvent {
    pub award_id: AwardId,
    pub game_title_key: GameTitleKey,
    pub achievement_name: String,
    pub player_id: String,
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub sequence: u64,
}

impl AwardEvent {
    /// Ordering key for "most recent first" feeds.
    pub fn recency_key(&self) -> (Timestamp, u64) {
        (self.created_at, self.sequence)
    }
}

/// Award event payload handed to the store; identity and sequence are
/// assigned at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAwardEvent {
    pub game_title_key: GameTitleKey,
    pub achievement_name: String,
    pub player_id: String,
    pub player_name: String,
    pub fields: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl NewAwardEvent {
    /// Materialize the event with a store-assigned sequence number.
    pub fn into_event(self, sequence: u64) -> AwardEvent {
        AwardEvent {
            award_id: new_award_id(),
            game_title_key: self.game_title_key,
            achievement_name: self.achievement_name,
            player_id: self.player_id,
            player_name: self.player_name,
            fields: self.fields,
            created_at: self.created_at,
            sequence,
        }
    }
}

/// Write-time policy for a player who already holds the achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// At most one event per (title, achievement, player).
    #[default]
    Unique,
    /// Record another event alongside the existing ones.
    AllowDuplicates,
}

impl DuplicatePolicy {
    pub fn from_allow_duplicates(allow: bool) -> Self {
        if allow {
            Self::AllowDuplicates
        } else {
            Self::Unique
        }
    }
}

/// Incoming award request as received from a client.
///
/// Every field is optional so that missing input can be reported with a
/// specific error code instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardRequest {
    pub game_title_key: Option<GameTitleKey>,
    pub achievement_name: Option<String>,
    pub achievement_secret_key: Option<String>,
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub fields: Option<serde_json::Value>,
    pub allow_duplicates: Option<bool>,
}

impl AwardRequest {
    pub fn new(game_title_key: impl Into<GameTitleKey>) -> Self {
        Self {
            game_title_key: Some(game_title_key.into()),
            ..Default::default()
        }
    }

    pub fn achievement(mut self, name: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.achievement_name = Some(name.into());
        self.achievement_secret_key = Some(secret_key.into());
        self
    }

    pub fn player(mut self, player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self.player_name = Some(player_name.into());
        self
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = Some(allow);
        self
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy::from_allow_duplicates(self.allow_duplicates.unwrap_or(false))
    }
}

/// A definition decorated with the requesting player's award and/or the
/// awards of their friends.
///
/// `None` decorations are omitted from the serialized form entirely, so a
/// consumer can tell "no award" apart from "an empty list of awards".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratedDefinition {
    #[serde(flatten)]
    pub definition: AchievementDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<AwardEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friends: Option<Vec<AwardEvent>>,
}

impl DecoratedDefinition {
    pub fn bare(definition: AchievementDefinition) -> Self {
        Self {
            definition,
            player: None,
            friends: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// One entry of an activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamItem {
    /// A single award event joined with its definition.
    #[serde(rename_all = "camelCase")]
    Award {
        player_name: String,
        awarded: AchievementDefinition,
    },
    /// All matching events of one player, collapsed.
    #[serde(rename_all = "camelCase")]
    Group {
        player_id: String,
        player_name: String,
        awards: u64,
        achievements: Vec<AchievementDefinition>,
    },
}

impl StreamItem {
    pub fn player_name(&self) -> &str {
        match self {
            Self::Award { player_name, .. } | Self::Group { player_name, .. } => player_name,
        }
    }

    /// Achievement names carried by this item, in feed order.
    pub fn achievement_names(&self) -> Vec<&str> {
        match self {
            Self::Award { awarded, .. } => vec![awarded.name.as_str()],
            Self::Group { achievements, .. } => {
                achievements.iter().map(|d| d.name.as_str()).collect()
            }
        }
    }
}

/// A page of feed items plus the size of the full matching set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPage {
    pub items: Vec<StreamItem>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn definition(name: &str) -> AchievementDefinition {
        AchievementDefinition::new(GameTitleKey::new("game"), name, "secret", Utc::now())
    }

    #[test]
    fn test_definition_secret_is_not_serialized() {
        let value = serde_json::to_value(definition("First Blood")).expect("serialize");
        assert_eq!(value["name"], "First Blood");
        assert!(value.get("secretKey").is_none());
        assert!(value.get("secret_key").is_none());
    }

    #[test]
    fn test_matches_secret() {
        let def = definition("First Blood");
        assert!(def.matches_secret("secret"));
        assert!(!def.matches_secret("Secret"));
        assert!(!def.matches_secret(""));
    }

    #[test]
    fn test_decorations_absent_when_none() {
        let bare = DecoratedDefinition::bare(definition("First Blood"));
        let value = serde_json::to_value(&bare).expect("serialize");
        assert!(value.get("player").is_none());
        assert!(value.get("friends").is_none());
        assert_eq!(value["name"], "First Blood");
    }

    #[test]
    fn test_award_event_fields_omitted_when_absent() {
        let event = NewAwardEvent {
            game_title_key: GameTitleKey::new("game"),
            achievement_name: "First Blood".to_string(),
            player_id: "1".to_string(),
            player_name: "ben".to_string(),
            fields: None,
            created_at: Utc::now(),
        }
        .into_event(7);
        let value = serde_json::to_value(&event).expect("serialize");
        assert!(value.get("fields").is_none());
        assert_eq!(value["playerName"], "ben");
        assert_eq!(value["sequence"], 7);
    }

    #[test]
    fn test_award_request_deserializes_with_missing_fields() {
        let req: AwardRequest = serde_json::from_value(json!({
            "gameTitleKey": "game",
            "achievementName": "First Blood",
            "playerId": "1"
        }))
        .expect("deserialize");
        assert_eq!(req.player_name, None);
        assert_eq!(req.duplicate_policy(), DuplicatePolicy::Unique);
    }

    #[test]
    fn test_stream_item_shapes() {
        let award = StreamItem::Award {
            player_name: "ben".to_string(),
            awarded: definition("First Blood"),
        };
        let value = serde_json::to_value(&award).expect("serialize");
        assert_eq!(value["playerName"], "ben");
        assert_eq!(value["awarded"]["name"], "First Blood");

        let group = StreamItem::Group {
            player_id: "1".to_string(),
            player_name: "ben".to_string(),
            awards: 2,
            achievements: vec![definition("First Blood")],
        };
        let value = serde_json::to_value(&group).expect("serialize");
        assert_eq!(value["awards"], 2);
        assert_eq!(value["achievements"][0]["name"], "First Blood");
        assert_eq!(group.achievement_names(), vec!["First Blood"]);
    }
}
