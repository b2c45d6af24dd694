//! Accolade Storage - Store Adapter Trait, In-Memory Store and Definition Cache
//!
//! Defines the storage abstraction the engine talks to. Production backends
//! implement [`AchievementStore`]; [`InMemoryStore`] is the reference
//! implementation used for tests and development.

pub mod cache;
pub mod memory;
pub mod store;

pub use cache::{CacheEntry, CacheStats, DefinitionCache};
pub use memory::InMemoryStore;
pub use store::{AchievementStore, AwardFilter, InsertOutcome, Page};
