//! Error types for Accolade operations

use crate::GameTitleKey;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Stable outcome codes surfaced to the API layer.
///
/// Every engine call produces exactly one of these, including soft outcomes
/// such as a duplicate award that was intentionally not saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    NoError = 0,
    NoAchievement = 1,
    NoPlayerId = 2,
    NoPlayerName = 3,
    InvalidAchievement = 4,
    AlreadyHadAchievementNotSaved = 5,
    AlreadyHadAchievementSaved = 6,
    /// Infrastructure failure (storage, cache, configuration).
    GeneralError = 7,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::NoError),
            1 => Some(Self::NoAchievement),
            2 => Some(Self::NoPlayerId),
            3 => Some(Self::NoPlayerName),
            4 => Some(Self::InvalidAchievement),
            5 => Some(Self::AlreadyHadAchievementNotSaved),
            6 => Some(Self::AlreadyHadAchievementSaved),
            7 => Some(Self::GeneralError),
            _ => None,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Record not found: {what}")]
    NotFound { what: String },

    #[error("Insert failed for {what}: {reason}")]
    InsertFailed { what: String, reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Award request validation errors.
///
/// Variants are listed in the order the validator checks them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No achievement name provided")]
    NoAchievement,

    #[error("No player id provided")]
    NoPlayerId,

    #[error("No player name provided")]
    NoPlayerName,

    #[error("Invalid achievement {achievement_name:?} for game title {game_title_key}")]
    InvalidAchievement {
        game_title_key: GameTitleKey,
        achievement_name: String,
    },
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoAchievement => ErrorCode::NoAchievement,
            Self::NoPlayerId => ErrorCode::NoPlayerId,
            Self::NoPlayerName => ErrorCode::NoPlayerName,
            Self::InvalidAchievement { .. } => ErrorCode::InvalidAchievement,
        }
    }
}

/// Definition cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Definition cache has not completed its first load")]
    NotReady,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Accolade errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccoladeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AccoladeError {
    /// The code the API layer reports alongside this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code(),
            Self::Storage(_) | Self::Cache(_) | Self::Config(_) => ErrorCode::GeneralError,
        }
    }
}

/// Result type alias for Accolade operations.
pub type AccoladeResult<T> = Result<T, AccoladeError>;

// =============================================================================
// TESTS
// =============================================================================
