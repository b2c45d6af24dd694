//! Accolade Engine - Award Validation, Write Path and Read Aggregation
//!
//! Wires the definition cache and an [`AchievementStore`] into the four
//! engine components:
//!
//! - [`AwardValidator`]: turns a raw [`AwardRequest`] into a [`ValidatedAward`]
//! - [`AwardWriter`]: persists validated awards under the duplicate policy
//! - [`ListingAggregator`]: definitions decorated with player and friend awards
//! - [`StreamAggregator`]: the paginated, optionally grouped activity feed
//!
//! [`AchievementEngine`] is the facade an API layer holds on to.
//!
//! [`AchievementStore`]: accolade_storage::AchievementStore
//! [`AwardRequest`]: accolade_core::AwardRequest

pub mod engine;
pub mod jobs;
pub mod listing;
pub mod stream;
pub mod telemetry;
pub mod validator;
pub mod writer;

pub use engine::{error_code_of, AchievementEngine};
pub use jobs::{
    definition_refresh_task, DefinitionRefreshConfig, DefinitionRefreshMetrics,
    DefinitionRefreshSnapshot,
};
pub use listing::{ListQuery, ListingAggregator};
pub use stream::{StreamAggregator, StreamQuery};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use validator::{AwardValidator, ValidatedAward};
pub use writer::{AwardWriter, SaveOutcome};
