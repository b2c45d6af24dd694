//! End-to-end replay of the award, listing and stream flow over the
//! in-memory store, with awards spaced apart on a manual clock.

use accolade_core::{AwardRequest, EngineConfig, ErrorCode, StreamItem, StreamPage};
use accolade_engine::{error_code_of, AchievementEngine, ListQuery, SaveOutcome, StreamQuery};
use accolade_storage::InMemoryStore;
use accolade_test_utils::assertions::{assert_error_code, assert_validation_error};
use accolade_test_utils::fixtures::{self, BEN, FRED, MICHELLE, OZDY};
use accolade_test_utils::ManualClock;
use std::sync::Arc;

const FIRST: &str = "Super Mega Achievement #1";
const SECOND: &str = "Super Mega Achievement #2";
const THIRD: &str = "Super Mega Achievement #3";

struct Scenario {
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    engine: AchievementEngine<InMemoryStore>,
}

async fn scenario() -> Scenario {
    let store = Arc::new(InMemoryStore::new());
    fixtures::seed_standard_title(store.as_ref(), &fixtures::standard_title())
        .await
        .expect("seed");
    let clock = Arc::new(ManualClock::at_fixed_start());
    let engine = AchievementEngine::with_clock(
        Arc::clone(&store),
        EngineConfig::default(),
        clock.clone(),
    );
    engine.start().await.expect("start");
    Scenario {
        store,
        clock,
        engine,
    }
}

fn request(index: usize, player: (&str, &str)) -> AwardRequest {
    fixtures::award_request(&fixtures::standard_title(), index, player)
}

fn feed(page: &StreamPage) -> Vec<(&str, Vec<&str>)> {
    page.items
        .iter()
        .map(|item| (item.player_name(), item.achievement_names()))
        .collect()
}

fn group_awards(page: &StreamPage) -> Vec<u64> {
    page.items
        .iter()
        .map(|item| match item {
            StreamItem::Group { awards, .. } => *awards,
            StreamItem::Award { .. } => panic!("expected grouped items"),
        })
        .collect()
}

#[tokio::test]
async fn test_full_award_list_stream_flow() {
    let s = scenario().await;
    let title = fixtures::standard_title();

    // Definitions load in name order.
    let definitions = s.engine.cache().get(&title).expect("cached");
    let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec![FIRST, SECOND, THIRD]);

    // One-time award.
    s.clock.advance_secs(2);
    let first = s.engine.save(request(0, BEN)).await;
    assert_eq!(error_code_of(&first), ErrorCode::NoError);
    let again = s.engine.save(request(0, BEN)).await;
    assert_eq!(error_code_of(&again), ErrorCode::AlreadyHadAchievementNotSaved);

    // Invalid achievements.
    let misspelt = AwardRequest::new(title.clone())
        .achievement("Super Mega Spelt Wrong", "secretkey")
        .player(BEN.0, BEN.1);
    assert_error_code(&s.engine.save(misspelt).await, ErrorCode::InvalidAchievement);
    let wrong_key = AwardRequest::new(title.clone())
        .achievement(FIRST, "invalidkey")
        .player(BEN.0, BEN.1);
    assert_error_code(&s.engine.save(wrong_key).await, ErrorCode::InvalidAchievement);

    // Missing data.
    let mut no_name = request(0, BEN);
    no_name.player_name = None;
    assert_error_code(&s.engine.save(no_name).await, ErrorCode::NoPlayerName);

    let mut no_id = request(0, BEN);
    no_id.player_id = None;
    no_id.achievement_secret_key = Some("invalidkey".to_string());
    assert_error_code(&s.engine.save(no_id).await, ErrorCode::NoPlayerId);

    let mut no_achievement = request(0, BEN);
    no_achievement.achievement_name = None;
    no_achievement.achievement_secret_key = None;
    let result = s.engine.save(no_achievement).await;
    assert_validation_error(&result);
    assert_error_code(&result, ErrorCode::NoAchievement);

    // Plain listing.
    let listed = s
        .engine
        .list(&ListQuery::new(title.clone()))
        .await
        .expect("list");
    assert_eq!(listed.iter().map(|d| d.name()).collect::<Vec<_>>(), vec![FIRST, SECOND, THIRD]);

    // Listing with a player.
    let listed = s
        .engine
        .list(&ListQuery::new(title.clone()).player(BEN.0))
        .await
        .expect("list");
    let mine = listed[0].player.as_ref().expect("ben has #1");
    assert_eq!((mine.player_name.as_str(), mine.player_id.as_str()), ("ben", "1"));
    assert!(listed[1].player.is_none());
    assert!(listed[2].player.is_none());

    // Listing with friends.
    s.clock.advance_secs(2);
    assert_eq!(error_code_of(&s.engine.save(request(0, FRED)).await), ErrorCode::NoError);
    s.clock.advance_secs(2);
    assert_eq!(error_code_of(&s.engine.save(request(1, MICHELLE)).await), ErrorCode::NoError);

    let listed = s
        .engine
        .list(&ListQuery::new(title.clone()).friends([BEN.0, FRED.0, MICHELLE.0]))
        .await
        .expect("list");
    let friends_of = |i: usize| -> Vec<String> {
        listed[i]
            .friends
            .as_ref()
            .map(|f| f.iter().map(|e| e.player_name.clone()).collect())
            .unwrap_or_default()
    };
    assert_eq!(friends_of(0), vec!["ben", "fred"]);
    assert_eq!(friends_of(1), vec!["michelle"]);
    assert!(listed[2].friends.is_none());

    // Listing with player and friends.
    let listed = s
        .engine
        .list(&ListQuery::new(title.clone()).player(BEN.0).friends([FRED.0, MICHELLE.0]))
        .await
        .expect("list");
    assert_eq!(listed[0].player.as_ref().map(|e| e.player_name.as_str()), Some("ben"));
    assert!(listed[1].player.is_none());
    assert_eq!(
        listed[0].friends.as_ref().map(|f| f.len()),
        Some(1),
        "ben is the player, not a friend"
    );
    assert_eq!(listed[1].friends.as_ref().map(|f| f[0].player_name.as_str()), Some("michelle"));
    assert!(listed[2].friends.is_none());

    // Duplicate awards.
    s.clock.advance_secs(2);
    let not_saved = s
        .engine
        .save(
            request(0, FRED)
                .with_fields(serde_json::json!({ "newer": true }))
                .allow_duplicates(false),
        )
        .await;
    assert_eq!(error_code_of(&not_saved), ErrorCode::AlreadyHadAchievementNotSaved);

    s.clock.advance_secs(3);
    let saved_again = s
        .engine
        .save(
            request(1, MICHELLE)
                .with_fields(serde_json::json!({ "newer": true }))
                .allow_duplicates(true),
        )
        .await;
    assert_eq!(error_code_of(&saved_again), ErrorCode::AlreadyHadAchievementSaved);
    assert!(matches!(saved_again, Ok(SaveOutcome::AlreadyHadSaved(_))));
    assert_eq!(s.store.award_count().expect("count"), 4);

    // Unknown friend id "4" is simply not matched.
    let listed = s
        .engine
        .list(
            &ListQuery::new(title.clone())
                .player(BEN.0)
                .friends([FRED.0, MICHELLE.0, OZDY.0]),
        )
        .await
        .expect("list");
    let fred_entry = &listed[0].friends.as_ref().expect("friends on #1")[0];
    assert_eq!(fred_entry.player_name, "fred");
    assert!(fred_entry.fields.is_none());
    let second_friends = listed[1].friends.as_ref().expect("friends on #2");
    assert_eq!(second_friends.len(), 2);
    assert_eq!(second_friends[1].player_name, "michelle");
    assert_eq!(
        second_friends[1].fields.as_ref().and_then(|f| f.get("newer")),
        Some(&serde_json::json!(true))
    );
    assert!(listed[2].friends.is_none());

    let json = serde_json::to_value(&listed).expect("serialize");
    assert!(json[0].get("player").is_some());
    assert!(json[1].get("player").is_none());
    assert!(json[2].get("friends").is_none());
    assert!(json[0]["friends"][0].get("fields").is_none());
    assert_eq!(json[1]["friends"][1]["fields"]["newer"], true);

    // Ungrouped stream.
    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()))
        .await
        .expect("stream");
    assert_eq!(page.total_count, 4);
    assert_eq!(
        feed(&page),
        vec![
            ("michelle", vec![SECOND]),
            ("michelle", vec![SECOND]),
            ("fred", vec![FIRST]),
            ("ben", vec![FIRST]),
        ]
    );

    // One player.
    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()).player(BEN.0))
        .await
        .expect("stream");
    assert_eq!(page.total_count, 1);
    assert_eq!(feed(&page), vec![("ben", vec![FIRST])]);

    // One friend, paged.
    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()).friends([MICHELLE.0]).per_page(1))
        .await
        .expect("stream");
    assert_eq!(page.total_count, 2);
    assert_eq!(feed(&page), vec![("michelle", vec![SECOND])]);

    // Grouped, everyone. Players appear in order of their latest award.
    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()).grouped(true))
        .await
        .expect("stream");
    assert_eq!(page.total_count, 3);
    assert_eq!(
        feed(&page),
        vec![("michelle", vec![SECOND]), ("fred", vec![FIRST]), ("ben", vec![FIRST])]
    );
    assert_eq!(group_awards(&page), vec![2, 1, 1]);

    // Grouped, one player.
    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()).player(BEN.0).grouped(true))
        .await
        .expect("stream");
    assert_eq!(page.total_count, 1);
    assert_eq!(group_awards(&page), vec![1]);

    // Grouped, player and friends.
    let page = s
        .engine
        .stream(
            &StreamQuery::new(title.clone())
                .player(BEN.0)
                .friends([FRED.0, MICHELLE.0])
                .grouped(true),
        )
        .await
        .expect("stream");
    assert_eq!(page.total_count, 3);
    assert_eq!(group_awards(&page), vec![2, 1, 1]);

    // A first award with duplicates allowed is still a plain save.
    s.clock.advance_secs(2);
    let ozdy = s
        .engine
        .save(
            request(1, OZDY)
                .with_fields(serde_json::json!({ "newer": true }))
                .allow_duplicates(true),
        )
        .await;
    assert_eq!(error_code_of(&ozdy), ErrorCode::NoError);
}

#[tokio::test]
async fn test_friends_order_ignores_input_order() {
    let s = scenario().await;
    let title = fixtures::standard_title();

    for player in [MICHELLE, BEN, FRED] {
        s.clock.advance_secs(2);
        s.engine.save(request(2, player)).await.expect("save");
    }

    for friends in [
        [BEN.0, FRED.0, MICHELLE.0],
        [MICHELLE.0, FRED.0, BEN.0],
        [FRED.0, MICHELLE.0, BEN.0],
    ] {
        let listed = s
            .engine
            .list(&ListQuery::new(title.clone()).friends(friends))
            .await
            .expect("list");
        let order: Vec<&str> = listed[2]
            .friends
            .as_ref()
            .expect("friends")
            .iter()
            .map(|e| e.player_name.as_str())
            .collect();
        assert_eq!(order, vec!["michelle", "ben", "fred"]);
    }
}

#[tokio::test]
async fn test_stream_recency_and_pagination() {
    let s = scenario().await;
    let title = fixtures::standard_title();

    s.clock.advance_secs(2);
    s.engine.save(request(0, BEN)).await.expect("save");
    s.clock.advance_secs(2);
    s.engine.save(request(1, BEN)).await.expect("save");

    let page = s
        .engine
        .stream(&StreamQuery::new(title.clone()).per_page(1))
        .await
        .expect("stream");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_count, 2);
    assert_eq!(feed(&page), vec![("ben", vec![SECOND])]);

    let grouped = s
        .engine
        .stream(&StreamQuery::new(title).grouped(true))
        .await
        .expect("stream");
    assert_eq!(grouped.total_count, 1);
    assert_eq!(feed(&grouped), vec![("ben", vec![SECOND, FIRST])]);
    assert_eq!(group_awards(&grouped), vec![2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_saves_store_one_row() {
    let s = scenario().await;
    let engine = Arc::new(s.engine);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move { engine.save(request(0, BEN)).await }));
    }

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(error_code_of(&handle.await.expect("join")));
    }

    assert_eq!(codes.iter().filter(|c| **c == ErrorCode::NoError).count(), 1);
    assert_eq!(
        codes
            .iter()
            .filter(|c| **c == ErrorCode::AlreadyHadAchievementNotSaved)
            .count(),
        15
    );
    assert_eq!(s.store.award_count().expect("count"), 1);
}
