//! Definition Refresh Background Task
//!
//! Keeps the definition cache close to the store without callers having to
//! ask for it. Each cycle runs a full [`DefinitionCache::reload`]; a failed
//! cycle leaves the previous entries in place, flagged stale, and the next
//! cycle tries again.
//!
//! The first tick fires immediately, so spawning the task also performs the
//! initial load when nothing else has.

use accolade_core::EngineConfig;
use accolade_storage::{AchievementStore, DefinitionCache};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the definition refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRefreshConfig {
    /// Time between reloads (default: 5 minutes)
    pub refresh_interval: Duration,

    /// Log every successful cycle at info instead of trace (default: false)
    pub log_cycles: bool,
}

impl Default for DefinitionRefreshConfig {
    fn default() -> Self {
        Self::from_engine_config(&EngineConfig::default())
    }
}

impl DefinitionRefreshConfig {
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            refresh_interval: config.cache_refresh_interval,
            log_cycles: false,
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for refresh activity since the task started.
#[derive(Debug, Default)]
pub struct DefinitionRefreshMetrics {
    /// Cycles run, successful or not
    pub refresh_cycles: AtomicU64,

    /// Cycles whose reload failed
    pub refresh_failures: AtomicU64,

    /// Titles loaded by the most recent successful cycle
    pub titles_loaded: AtomicU64,
}

impl DefinitionRefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DefinitionRefreshSnapshot {
        DefinitionRefreshSnapshot {
            refresh_cycles: self.refresh_cycles.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            titles_loaded: self.titles_loaded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DefinitionRefreshMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRefreshSnapshot {
    pub refresh_cycles: u64,
    pub refresh_failures: u64,
    pub titles_loaded: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Periodically reload `cache` until `shutdown_rx` observes `true`.
///
/// Returns the metrics collected over the task's lifetime.
pub async fn definition_refresh_task<S>(
    cache: DefinitionCache<S>,
    config: DefinitionRefreshConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<DefinitionRefreshMetrics>
where
    S: AchievementStore + 'static,
{
    let metrics = Arc::new(DefinitionRefreshMetrics::new());

    let mut refresh_interval = interval(config.refresh_interval);
    refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        refresh_interval_secs = config.refresh_interval.as_secs(),
        "Definition refresh task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender also means shutdown.
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Definition refresh task shutting down");
                    break;
                }
            }

            _ = refresh_interval.tick() => {
                refresh_once(&cache, &config, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        refresh_cycles = snapshot.refresh_cycles,
        refresh_failures = snapshot.refresh_failures,
        "Definition refresh task completed"
    );

    metrics
}

async fn refresh_once<S>(
    cache: &DefinitionCache<S>,
    config: &DefinitionRefreshConfig,
    metrics: &DefinitionRefreshMetrics,
) where
    S: AchievementStore + 'static,
{
    metrics.refresh_cycles.fetch_add(1, Ordering::Relaxed);

    match cache.reload().await {
        Ok(titles) => {
            metrics.titles_loaded.store(titles as u64, Ordering::Relaxed);
            if config.log_cycles {
                tracing::info!(titles, "Definition refresh cycle completed");
            } else {
                tracing::trace!(titles, "Definition refresh cycle completed");
            }
        }
        Err(_) => {
            // reload() already logged the cause.
            metrics.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}
