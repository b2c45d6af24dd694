//! Accolade Core - Entity Types
//!
//! Pure data structures shared by the storage and engine crates.
//! This crate contains ONLY data types and their invariants - no I/O.

pub mod clock;
pub mod config;
pub mod entities;
pub mod error;
pub mod identity;

pub use clock::{Clock, SystemClock};
pub use config::EngineConfig;
pub use entities::{
    AchievementDefinition, AwardEvent, AwardRequest, DecoratedDefinition, DuplicatePolicy,
    NewAwardEvent, StreamItem, StreamPage,
};
pub use error::{
    AccoladeError, AccoladeResult, CacheError, ConfigError, ErrorCode, StorageError,
    ValidationError,
};
pub use identity::{new_award_id, AwardId, GameTitleKey, Timestamp};
