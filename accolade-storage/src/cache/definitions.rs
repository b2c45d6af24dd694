//! Per-game-title definition cache backed by an [`AchievementStore`].

use super::entry::CacheEntry;
use crate::store::AchievementStore;
use accolade_core::{AccoladeResult, AchievementDefinition, CacheError, GameTitleKey};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Statistics about cache contents and refresh history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of game titles with a cached entry.
    pub titles: usize,
    /// Total number of cached definitions across titles.
    pub definitions: usize,
    /// Successful full reloads.
    pub reloads: u64,
    /// Failed reloads (full or per-title).
    pub reload_failures: u64,
    /// Whether the cache is currently usable without a pending full reload.
    pub ready: bool,
}

/// Which load generations have been applied.
///
/// Full and per-title reloads draw from the same generation counter, so a
/// load that read the store earlier never replaces the result of one that
/// read it later.
#[derive(Debug, Default)]
struct LoadState {
    /// Generation of the last applied full reload.
    full: u64,
    /// Newest generation claimed by a per-title reload, while newer than `full`.
    titles: HashMap<GameTitleKey, u64>,
}

impl LoadState {
    fn title_superseded(&self, game_title_key: &GameTitleKey, generation: u64) -> bool {
        self.titles
            .get(game_title_key)
            .is_some_and(|claimed| *claimed > generation)
    }
}

struct CacheInner<S> {
    store: Arc<S>,
    entries: DashMap<GameTitleKey, Arc<CacheEntry>>,
    /// Set by the first successful full reload, never cleared.
    loaded: AtomicBool,
    /// Forced full reloads scheduled but not yet finished.
    pending_full: AtomicUsize,
    /// Last generation handed to a full or per-title reload.
    generation: AtomicU64,
    /// Held while a load result is applied. Never held across an await.
    state: Mutex<LoadState>,
    reloads: AtomicU64,
    reload_failures: AtomicU64,
}

/// In-memory index of achievement definitions, one snapshot per game title.
///
/// Clones share the same state. Lookups are lock-free apart from a
/// `DashMap` shard read and never wait on a reload.
pub struct DefinitionCache<S: AchievementStore + 'static> {
    inner: Arc<CacheInner<S>>,
}

impl<S: AchievementStore + 'static> Clone for DefinitionCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: AchievementStore + 'static> DefinitionCache<S> {
    /// Create an empty, not-yet-ready cache over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                entries: DashMap::new(),
                loaded: AtomicBool::new(false),
                pending_full: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                state: Mutex::new(LoadState::default()),
                reloads: AtomicU64::new(0),
                reload_failures: AtomicU64::new(0),
            }),
        }
    }

    /// The store this cache reloads from.
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// True once a full load has completed and no forced reload is pending.
    pub fn is_ready(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
            && self.inner.pending_full.load(Ordering::SeqCst) == 0
    }

    /// True when the title's entry reflects the latest successful load.
    pub fn is_title_fresh(&self, game_title_key: &GameTitleKey) -> bool {
        match self.inner.entries.get(game_title_key) {
            Some(entry) => entry.is_fresh(),
            None => self.inner.loaded.load(Ordering::SeqCst),
        }
    }

    /// The current snapshot for a title, if one is cached.
    ///
    /// Fails with [`CacheError::NotReady`] before the first load and while a
    /// forced full reload is pending.
    pub fn entry(&self, game_title_key: &GameTitleKey) -> AccoladeResult<Option<Arc<CacheEntry>>> {
        self.ensure_ready()?;
        Ok(self
            .inner
            .entries
            .get(game_title_key)
            .map(|entry| Arc::clone(entry.value())))
    }

    /// Definitions for a title, ordered by name. Unknown titles yield an
    /// empty slice.
    pub fn get(&self, game_title_key: &GameTitleKey) -> AccoladeResult<Arc<[AchievementDefinition]>> {
        Ok(match self.entry(game_title_key)? {
            Some(entry) => entry.definitions(),
            None => Arc::from(Vec::new()),
        })
    }

    /// Look up one definition by (title, name).
    pub fn find(
        &self,
        game_title_key: &GameTitleKey,
        name: &str,
    ) -> AccoladeResult<Option<AchievementDefinition>> {
        Ok(self
            .entry(game_title_key)?
            .and_then(|entry| entry.find(name).cloned()))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            titles: self.inner.entries.len(),
            definitions: self.inner.entries.iter().map(|e| e.len()).sum(),
            reloads: self.inner.reloads.load(Ordering::Relaxed),
            reload_failures: self.inner.reload_failures.load(Ordering::Relaxed),
            ready: self.is_ready(),
        }
    }

    fn ensure_ready(&self) -> AccoladeResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CacheError::NotReady.into())
        }
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Mark the cache not-ready and reload everything in the background.
    ///
    /// Lookups fail with [`CacheError::NotReady`] until the reload finishes,
    /// whether it succeeds or not. Returns immediately. Must be called from
    /// within a tokio runtime; outside one the request is logged and ignored.
    pub fn force_refresh(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("Definition refresh requested outside a tokio runtime; ignored");
                return;
            }
        };

        self.inner.pending_full.fetch_add(1, Ordering::SeqCst);
        let cache = self.clone();
        handle.spawn(async move {
            // Failures are logged inside reload() and the stale entries kept.
            let _ = cache.reload().await;
            cache.inner.pending_full.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Mark one title stale and reload only that title in the background.
    ///
    /// Other titles stay readable and fresh throughout.
    pub fn force_refresh_title(&self, game_title_key: GameTitleKey) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(
                    game_title_key = %game_title_key,
                    "Title refresh requested outside a tokio runtime; ignored"
                );
                return;
            }
        };

        let generation = self.claim_title(&game_title_key);
        self.mark_title_stale(&game_title_key);
        let cache = self.clone();
        handle.spawn(async move {
            let _ = cache.load_title(&game_title_key, generation).await;
        });
    }

    /// Reload every title from the store and swap the entries in.
    ///
    /// On failure the previous entries are kept, flagged stale, and the
    /// error is returned to the caller (readers never see it). Titles that a
    /// newer per-title reload has claimed are left alone. Returns the number
    /// of titles loaded.
    pub async fn reload(&self) -> AccoladeResult<usize> {
        let generation = self.next_generation();

        let definitions = match self.inner.store.find_all_definitions().await {
            Ok(definitions) => definitions,
            Err(e) => {
                self.inner.reload_failures.fetch_add(1, Ordering::Relaxed);
                let state = self.lock_state();
                if state.full < generation {
                    for mut entry in self.inner.entries.iter_mut() {
                        if !state.title_superseded(entry.key(), generation) {
                            let stale = Arc::new(entry.value().to_stale());
                            *entry.value_mut() = stale;
                        }
                    }
                }
                drop(state);
                tracing::warn!(error = %e, generation, "Definition reload failed; serving stale definitions");
                return Err(e);
            }
        };

        let mut grouped: HashMap<GameTitleKey, Vec<AchievementDefinition>> = HashMap::new();
        for definition in definitions {
            grouped
                .entry(definition.game_title_key.clone())
                .or_default()
                .push(definition);
        }
        let titles = grouped.len();

        let mut state = self.lock_state();
        if state.full > generation {
            tracing::trace!(generation, applied = state.full, "Discarding superseded definition reload");
            return Ok(titles);
        }

        self.inner
            .entries
            .retain(|key, _| grouped.contains_key(key) || state.title_superseded(key, generation));
        for (key, defs) in grouped {
            if state.title_superseded(&key, generation) {
                tracing::trace!(game_title_key = %key, generation, "Keeping newer title load");
                continue;
            }
            self.inner.entries.insert(key, Arc::new(CacheEntry::new(defs)));
        }
        state.full = generation;
        state.titles.retain(|_, claimed| *claimed > generation);
        drop(state);

        self.inner.loaded.store(true, Ordering::SeqCst);
        self.inner.reloads.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(titles, generation, "Definition cache reloaded");
        Ok(titles)
    }

    /// Reload a single title from the store and swap its entry in.
    ///
    /// Returns the number of definitions loaded for the title.
    pub async fn reload_title(&self, game_title_key: &GameTitleKey) -> AccoladeResult<usize> {
        let generation = self.claim_title(game_title_key);
        self.load_title(game_title_key, generation).await
    }

    async fn load_title(&self, game_title_key: &GameTitleKey, generation: u64) -> AccoladeResult<usize> {
        let result = self.inner.store.find_definitions(game_title_key).await;

        let state = self.lock_state();
        let superseded =
            state.full > generation || state.title_superseded(game_title_key, generation);

        match result {
            Ok(definitions) => {
                let count = definitions.len();
                if superseded {
                    tracing::trace!(
                        game_title_key = %game_title_key,
                        generation,
                        "Discarding superseded title reload"
                    );
                } else if definitions.is_empty() {
                    self.inner.entries.remove(game_title_key);
                } else {
                    self.inner
                        .entries
                        .insert(game_title_key.clone(), Arc::new(CacheEntry::new(definitions)));
                }
                drop(state);
                tracing::debug!(game_title_key = %game_title_key, count, "Title definitions reloaded");
                Ok(count)
            }
            Err(e) => {
                self.inner.reload_failures.fetch_add(1, Ordering::Relaxed);
                if !superseded {
                    self.mark_title_stale(game_title_key);
                }
                drop(state);
                tracing::warn!(
                    game_title_key = %game_title_key,
                    error = %e,
                    "Title definition reload failed; serving stale definitions"
                );
                Err(e)
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Take a generation for a per-title reload and record the claim, so an
    /// older full reload finishing later skips this title.
    fn claim_title(&self, game_title_key: &GameTitleKey) -> u64 {
        let mut state = self.lock_state();
        let generation = self.next_generation();
        state.titles.insert(game_title_key.clone(), generation);
        generation
    }

    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_title_stale(&self, game_title_key: &GameTitleKey) {
        let stale = match self.inner.entries.get(game_title_key) {
            Some(entry) => entry.to_stale(),
            None => CacheEntry::new(Vec::new()).to_stale(),
        };
        self.inner
            .entries
            .insert(game_title_key.clone(), Arc::new(stale));
    }
}
