//! Engine configuration
//!
//! Loaded from environment variables with sensible defaults for development.

use crate::{AccoladeResult, ConfigError};
use std::time::Duration;

/// Engine tunables for paging and definition cache refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page size used when a stream query does not specify one.
    pub default_per_page: u32,

    /// Upper bound on any requested page size.
    pub max_per_page: u32,

    /// Whether the periodic definition refresh job should run.
    pub cache_refresh_enabled: bool,

    /// Interval between periodic definition cache reloads.
    pub cache_refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
            cache_refresh_enabled: true,
            cache_refresh_interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create EngineConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ACCOLADE_DEFAULT_PER_PAGE`: Default stream page size (default: 20)
    /// - `ACCOLADE_MAX_PER_PAGE`: Maximum stream page size (default: 100)
    /// - `ACCOLADE_CACHE_REFRESH_ENABLED`: "true" or "false" (default: true)
    /// - `ACCOLADE_CACHE_REFRESH_SECS`: Seconds between cache reloads (default: 300)
    pub fn from_env() -> AccoladeResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup, then validate it.
    pub fn from_lookup<F>(lookup: F) -> AccoladeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_per_page = lookup("ACCOLADE_DEFAULT_PER_PAGE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.default_per_page);

        let max_per_page = lookup("ACCOLADE_MAX_PER_PAGE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_per_page);

        let cache_refresh_enabled = lookup("ACCOLADE_CACHE_REFRESH_ENABLED")
            .map(|s| s.trim().to_lowercase() != "false")
            .unwrap_or(defaults.cache_refresh_enabled);

        let cache_refresh_interval = lookup("ACCOLADE_CACHE_REFRESH_SECS")
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_refresh_interval);

        let config = Self {
            default_per_page,
            max_per_page,
            cache_refresh_enabled,
            cache_refresh_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the default page size.
    pub fn with_default_per_page(mut self, per_page: u32) -> Self {
        self.default_per_page = per_page;
        self
    }

    /// Set the maximum page size.
    pub fn with_max_per_page(mut self, max: u32) -> Self {
        self.max_per_page = max;
        self
    }

    /// Set the cache refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.cache_refresh_interval = interval;
        self
    }

    /// Enable or disable the periodic refresh job.
    pub fn with_refresh_enabled(mut self, enabled: bool) -> Self {
        self.cache_refresh_enabled = enabled;
        self
    }

    /// Resolve a requested page size against the configured bounds.
    ///
    /// `None` and zero fall back to the default; anything larger than the
    /// maximum is clamped.
    pub fn effective_per_page(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(0) | None => self.default_per_page,
            Some(n) => n.min(self.max_per_page),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AccoladeResult<()> {
        if self.default_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_per_page".to_string(),
                value: self.default_per_page.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        if self.max_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_per_page".to_string(),
                value: self.max_per_page.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        if self.default_per_page > self.max_per_page {
            return Err(ConfigError::InvalidValue {
                field: "default_per_page".to_string(),
                value: self.default_per_page.to_string(),
                reason: format!("must not exceed max_per_page ({})", self.max_per_page),
            }
            .into());
        }

        if self.cache_refresh_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache_refresh_interval".to_string(),
                value: "0s".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
