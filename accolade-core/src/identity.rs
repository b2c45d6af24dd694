//! Identity types for Accolade entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Award identifier using UUIDv7 for timestamp-sortable IDs.
pub type AwardId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 AwardId (timestamp-sortable).
pub fn new_award_id() -> AwardId {
    Uuid::now_v7()
}

/// Opaque tenant key partitioning all definitions and awards per game title.
///
/// Every store query and cache lookup takes one of these, so data for one
/// title is never reachable through another title's key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameTitleKey(String);

impl GameTitleKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for GameTitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameTitleKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for GameTitleKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for GameTitleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
