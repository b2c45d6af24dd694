//! Definition cache with explicit readiness and freshness.
//!
//! Achievement definitions are read on every award and every listing, but
//! change rarely. This module keeps a per-game-title snapshot of them in
//! memory and reloads it from the store on demand or on a schedule.
//!
//! # Readiness
//!
//! The cache is unusable until its first load completes. `force_refresh`
//! marks it not-ready and reloads in the background; callers that need
//! certainty poll [`DefinitionCache::is_ready`]. There is deliberately no
//! blocking wait.
//!
//! # Tenant Isolation
//!
//! Entries are keyed by [`GameTitleKey`](accolade_core::GameTitleKey) and
//! swapped one title at a time, so refreshing one title never blocks or
//! corrupts reads of another.
//!
//! # Example
//!
//! ```ignore
//! let cache = DefinitionCache::new(Arc::new(store));
//! cache.reload().await?;
//!
//! let definitions = cache.get(&title)?;
//! if !cache.is_title_fresh(&title) {
//!     tracing::debug!(%title, "serving stale definitions");
//! }
//! ```

pub mod definitions;
pub mod entry;

pub use definitions::{CacheStats, DefinitionCache};
pub use entry::CacheEntry;
