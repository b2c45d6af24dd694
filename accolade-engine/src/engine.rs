//! Engine facade over one shared store and definition cache.

use crate::jobs::{definition_refresh_task, DefinitionRefreshConfig, DefinitionRefreshMetrics};
use crate::listing::{ListQuery, ListingAggregator};
use crate::stream::{StreamAggregator, StreamQuery};
use crate::validator::AwardValidator;
use crate::writer::{AwardWriter, SaveOutcome};
use accolade_core::{
    AccoladeResult, AchievementDefinition, AwardRequest, Clock, DecoratedDefinition,
    EngineConfig, ErrorCode, GameTitleKey, StreamPage, SystemClock,
};
use accolade_storage::{AchievementStore, DefinitionCache};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The error code an API layer reports for a save, alongside the hard
/// error if there was one.
pub fn error_code_of(result: &AccoladeResult<SaveOutcome>) -> ErrorCode {
    match result {
        Ok(outcome) => outcome.code(),
        Err(e) => e.code(),
    }
}

/// Achievement engine: award writes, listings and the activity feed.
///
/// # Example
///
/// ```ignore
/// let engine = AchievementEngine::new(Arc::new(store), EngineConfig::from_env()?);
/// engine.start().await?;
///
/// let result = engine.save(request).await;
/// let code = error_code_of(&result);
/// ```
pub struct AchievementEngine<S: AchievementStore + 'static> {
    store: Arc<S>,
    cache: DefinitionCache<S>,
    config: EngineConfig,
    validator: AwardValidator<S>,
    writer: AwardWriter<S>,
    listing: ListingAggregator<S>,
    stream: StreamAggregator<S>,
}

impl<S: AchievementStore + 'static> AchievementEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = DefinitionCache::new(Arc::clone(&store));
        Self {
            validator: AwardValidator::new(cache.clone()),
            writer: AwardWriter::new(Arc::clone(&store), clock),
            listing: ListingAggregator::new(Arc::clone(&store), cache.clone()),
            stream: StreamAggregator::new(Arc::clone(&store), cache.clone(), config.clone()),
            store,
            cache,
            config,
        }
    }

    /// Perform the initial definition load.
    ///
    /// Returns the number of titles loaded.
    pub async fn start(&self) -> AccoladeResult<usize> {
        let titles = self.cache.reload().await?;
        tracing::info!(titles, "Achievement engine started");
        Ok(titles)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &DefinitionCache<S> {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // AWARDS
    // ========================================================================

    /// Validate and persist an award request.
    ///
    /// Validation failures come back as `Err` with a specific code; a
    /// duplicate that was not saved is an `Ok` outcome.
    pub async fn save(&self, request: AwardRequest) -> AccoladeResult<SaveOutcome> {
        let award = self.validator.validate(request)?;
        self.writer.save(award).await
    }

    pub async fn list(&self, query: &ListQuery) -> AccoladeResult<Vec<DecoratedDefinition>> {
        self.listing.list(query).await
    }

    pub async fn stream(&self, query: &StreamQuery) -> AccoladeResult<StreamPage> {
        self.stream.stream(query).await
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    /// Upsert a definition and schedule a refresh of its title.
    pub async fn register_definition(&self, definition: AchievementDefinition) -> AccoladeResult<()> {
        self.store.upsert_definition(&definition).await?;
        tracing::debug!(
            game_title_key = %definition.game_title_key,
            achievement = %definition.name,
            "Definition registered"
        );
        self.cache.force_refresh_title(definition.game_title_key);
        Ok(())
    }

    /// Remove every definition and award of a title.
    ///
    /// Returns the number of records removed.
    pub async fn purge_game_title(&self, game_title_key: &GameTitleKey) -> AccoladeResult<u64> {
        let removed = self.store.purge_game_title(game_title_key).await?;
        tracing::info!(game_title_key = %game_title_key, removed, "Game title purged");
        self.cache.force_refresh_title(game_title_key.clone());
        Ok(removed)
    }

    pub fn force_refresh(&self) {
        self.cache.force_refresh();
    }

    pub fn force_refresh_title(&self, game_title_key: GameTitleKey) {
        self.cache.force_refresh_title(game_title_key);
    }

    pub fn is_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// Spawn the periodic definition refresh job, unless disabled in config.
    pub fn spawn_refresh_job(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<Arc<DefinitionRefreshMetrics>>> {
        if !self.config.cache_refresh_enabled {
            tracing::info!("Definition refresh job disabled");
            return None;
        }
        let config = DefinitionRefreshConfig::from_engine_config(&self.config);
        Some(tokio::spawn(definition_refresh_task(
            self.cache.clone(),
            config,
            shutdown_rx,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accolade_core::{AccoladeError, ValidationError};
    use accolade_storage::InMemoryStore;
    use accolade_test_utils::fixtures::{self, BEN};
    use accolade_test_utils::{wait_until_ready, wait_until_title_fresh, ManualClock};
    use std::time::Duration;

    async fn started_engine() -> AchievementEngine<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        fixtures::seed_standard_title(store.as_ref(), &fixtures::standard_title())
            .await
            .expect("seed");
        let engine = AchievementEngine::with_clock(
            store,
            EngineConfig::default(),
            Arc::new(ManualClock::at_fixed_start()),
        );
        engine.start().await.expect("start");
        engine
    }

    #[test]
    fn test_error_code_of() {
        let err: AccoladeResult<SaveOutcome> = Err(ValidationError::NoPlayerId.into());
        assert_eq!(error_code_of(&err), ErrorCode::NoPlayerId);

        let infra: AccoladeResult<SaveOutcome> =
            Err(AccoladeError::Storage(accolade_core::StorageError::LockPoisoned));
        assert_eq!(error_code_of(&infra), ErrorCode::GeneralError);
    }

    #[tokio::test]
    async fn test_save_then_list() {
        let engine = started_engine().await;
        let title = fixtures::standard_title();

        let result = engine.save(fixtures::award_request(&title, 0, BEN)).await;
        assert_eq!(error_code_of(&result), ErrorCode::NoError);

        let listed = engine
            .list(&ListQuery::new(title).player(BEN.0))
            .await
            .expect("list");
        assert!(listed[0].player.is_some());
        assert!(listed[1].player.is_none());
    }

    #[tokio::test]
    async fn test_register_definition_becomes_awardable() {
        let engine = started_engine().await;
        let title = fixtures::standard_title();

        engine
            .register_definition(AchievementDefinition::new(
                title.clone(),
                "Brand New",
                "fresh-secret",
                fixtures::base_time(),
            ))
            .await
            .expect("register");
        assert!(wait_until_title_fresh(engine.cache(), &title, Duration::from_secs(2)).await);

        let request = AwardRequest::new(title)
            .achievement("Brand New", "fresh-secret")
            .player(BEN.0, BEN.1);
        let result = engine.save(request).await;
        assert_eq!(error_code_of(&result), ErrorCode::NoError);
    }

    #[tokio::test]
    async fn test_purge_game_title_resets() {
        let engine = started_engine().await;
        let title = fixtures::standard_title();
        engine
            .save(fixtures::award_request(&title, 0, BEN))
            .await
            .expect("save");

        let removed = engine.purge_game_title(&title).await.expect("purge");
        assert_eq!(removed, 4);
        engine.force_refresh();
        assert!(wait_until_ready(engine.cache(), Duration::from_secs(2)).await);
        assert!(engine.cache().get(&title).expect("get").is_empty());
    }

    #[tokio::test]
    async fn test_refresh_job_respects_config() {
        let store = Arc::new(InMemoryStore::new());
        let engine = AchievementEngine::new(
            Arc::clone(&store),
            EngineConfig::default().with_refresh_enabled(false),
        );
        let (_tx, rx) = watch::channel(false);
        assert!(engine.spawn_refresh_job(rx).is_none());

        let engine = AchievementEngine::new(store, EngineConfig::default());
        let (tx, rx) = watch::channel(false);
        let handle = engine.spawn_refresh_job(rx).expect("spawned");
        assert!(wait_until_ready(engine.cache(), Duration::from_secs(2)).await);
        tx.send(true).expect("shutdown");
        let metrics = handle.await.expect("join");
        assert!(metrics.snapshot().refresh_cycles >= 1);
    }
}
