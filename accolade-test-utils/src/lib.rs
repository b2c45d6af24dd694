//! Accolade Test Utilities
//!
//! Centralized test infrastructure for the Accolade workspace:
//! - A manual clock for deterministic award timestamps
//! - Proptest generators for requests and identifiers
//! - Fixtures for the standard three-achievement game title
//! - Custom assertions for error codes

pub use accolade_storage::{DefinitionCache, InMemoryStore};

pub use accolade_core::{
    AccoladeError, AccoladeResult, AchievementDefinition, AwardRequest, Clock, ErrorCode,
    GameTitleKey, Timestamp,
};

use chrono::{Duration, TimeZone, Utc};
use std::sync::Mutex;

// ============================================================================
// MANUAL CLOCK
// ============================================================================

/// A [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// A clock starting at a fixed, well-known instant.
    pub fn at_fixed_start() -> Self {
        Self::new(fixtures::base_time())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// READINESS
// ============================================================================

/// Poll a cache until it reports ready or `timeout` elapses.
///
/// Returns whether the cache became ready.
pub async fn wait_until_ready<S>(cache: &DefinitionCache<S>, timeout: std::time::Duration) -> bool
where
    S: accolade_storage::AchievementStore + 'static,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cache.is_ready() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}

/// Poll a cache until `title` is fresh or `timeout` elapses.
pub async fn wait_until_title_fresh<S>(
    cache: &DefinitionCache<S>,
    title: &GameTitleKey,
    timeout: std::time::Duration,
) -> bool
where
    S: accolade_storage::AchievementStore + 'static,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cache.is_title_fresh(title) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Accolade inputs.

    use super::*;
    use proptest::prelude::*;

    /// Generate a non-blank game title key.
    pub fn arb_game_title_key() -> impl Strategy<Value = GameTitleKey> {
        "[a-z][a-z0-9-]{2,15}".prop_map(GameTitleKey::new)
    }

    /// Generate a non-blank player id.
    pub fn arb_player_id() -> impl Strategy<Value = String> {
        "[0-9]{1,6}"
    }

    /// Generate a non-blank player name.
    pub fn arb_player_name() -> impl Strategy<Value = String> {
        "[a-z]{3,10}"
    }

    /// Generate a string that counts as missing input.
    pub fn arb_blank() -> impl Strategy<Value = Option<String>> {
        prop_oneof![Just(None), Just(Some(String::new())), " {1,4}".prop_map(Some)]
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    /// Generate an optional opaque `fields` payload.
    pub fn arb_fields() -> impl Strategy<Value = Option<serde_json::Value>> {
        proptest::option::of(
            (any::<u32>(), "[a-z]{0,8}")
                .prop_map(|(score, tag)| serde_json::json!({ "score": score, "tag": tag })),
        )
    }

    /// Generate a request for one of the standard achievements where each of
    /// achievement name, player id and player name may independently be
    /// missing.
    pub fn arb_partial_standard_request() -> impl Strategy<Value = AwardRequest> {
        (
            0usize..3,
            any::<bool>(),
            proptest::option::of(arb_player_id()),
            proptest::option::of(arb_player_name()),
            arb_blank(),
        )
            .prop_map(|(idx, has_name, player_id, player_name, blank)| {
                let (name, secret) = fixtures::STANDARD_ACHIEVEMENTS[idx];
                AwardRequest {
                    game_title_key: Some(GameTitleKey::new(fixtures::STANDARD_TITLE)),
                    achievement_name: if has_name { Some(name.to_string()) } else { blank.clone() },
                    achievement_secret_key: Some(secret.to_string()),
                    player_id: player_id.or_else(|| blank.clone()),
                    player_name: player_name.or(blank),
                    fields: None,
                    allow_duplicates: None,
                }
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built definitions, players and requests for common scenarios.

    use super::*;
    use accolade_storage::AchievementStore;

    /// Game title used by the standard scenario.
    pub const STANDARD_TITLE: &str = "test-game";

    /// (name, secret) of the three standard achievements, in name order.
    pub const STANDARD_ACHIEVEMENTS: [(&str, &str); 3] = [
        ("Super Mega Achievement #1", "secretkey"),
        ("Super Mega Achievement #2", "secretkey2"),
        ("Super Mega Achievement #3", "secretkey3"),
    ];

    /// (player_id, player_name) pairs.
    pub const BEN: (&str, &str) = ("1", "ben");
    pub const FRED: (&str, &str) = ("2", "fred");
    pub const MICHELLE: (&str, &str) = ("3", "michelle");
    pub const OZDY: (&str, &str) = ("4", "ozdy");

    /// The fixed instant [`ManualClock::at_fixed_start`] starts from.
    pub fn base_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn standard_title() -> GameTitleKey {
        GameTitleKey::new(STANDARD_TITLE)
    }

    /// The three standard definitions for `title`.
    pub fn standard_definitions(title: &GameTitleKey) -> Vec<AchievementDefinition> {
        STANDARD_ACHIEVEMENTS
            .iter()
            .map(|(name, secret)| AchievementDefinition::new(title.clone(), *name, *secret, base_time()))
            .collect()
    }

    /// Upsert the standard definitions into `store`.
    pub async fn seed_standard_title<S: AchievementStore + ?Sized>(
        store: &S,
        title: &GameTitleKey,
    ) -> AccoladeResult<Vec<AchievementDefinition>> {
        let definitions = standard_definitions(title);
        for definition in &definitions {
            store.upsert_definition(definition).await?;
        }
        Ok(definitions)
    }

    /// A complete, valid request awarding standard achievement `index`
    /// (0-based) to `player`.
    pub fn award_request(title: &GameTitleKey, index: usize, player: (&str, &str)) -> AwardRequest {
        let (name, secret) = STANDARD_ACHIEVEMENTS[index % STANDARD_ACHIEVEMENTS.len()];
        AwardRequest::new(title.clone())
            .achievement(name, secret)
            .player(player.0, player.1)
    }

    /// Name of standard achievement `index` (0-based).
    pub fn achievement_name(index: usize) -> &'static str {
        STANDARD_ACHIEVEMENTS[index % STANDARD_ACHIEVEMENTS.len()].0
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over engine outcome codes.

    use super::*;

    /// Assert that a result failed with a specific code.
    #[track_caller]
    pub fn assert_error_code<T: std::fmt::Debug>(result: &AccoladeResult<T>, expected: ErrorCode) {
        match result {
            Err(e) => assert_eq!(e.code(), expected, "Wrong error code for {e}"),
            Ok(v) => panic!("Expected error code {expected:?}, got Ok: {v:?}"),
        }
    }

    /// Assert that a result is a validation failure.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &AccoladeResult<T>) {
        match result {
            Err(AccoladeError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}
