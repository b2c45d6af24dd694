//! Tracing subscriber initialization.

use accolade_core::{AccoladeResult, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `"info,accolade_storage=debug"`
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl TelemetryConfig {
    /// Read `ACCOLADE_LOG` and `ACCOLADE_LOG_FORMAT` ("json" or "text").
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let filter = lookup("ACCOLADE_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.filter);
        let format = match lookup("ACCOLADE_LOG_FORMAT").map(|s| s.trim().to_lowercase()) {
            Some(f) if f == "json" => LogFormat::Json,
            _ => defaults.format,
        };
        Self { filter, format }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. A second call, or a call after some other
/// subscriber was installed, returns a config error.
pub fn init_tracing(config: &TelemetryConfig) -> AccoladeResult<()> {
    let env_filter = EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::InvalidValue {
        field: "ACCOLADE_LOG".to_string(),
        value: config.filter.clone(),
        reason: e.to_string(),
    })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.map_err(|e| ConfigError::InvalidValue {
        field: "tracing_subscriber".to_string(),
        value: format!("{:?}", config.format),
        reason: e.to_string(),
    })?;

    tracing::info!(filter = %config.filter, format = ?config.format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accolade_core::AccoladeError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, TelemetryConfig::default());
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn test_env_overrides() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("ACCOLADE_LOG", "debug,accolade_storage=trace"),
            ("ACCOLADE_LOG_FORMAT", " JSON "),
        ]));
        assert_eq!(config.filter, "debug,accolade_storage=trace");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = TelemetryConfig::default();
        let _ = init_tracing(&config);
        let second = init_tracing(&config);
        assert!(matches!(second, Err(AccoladeError::Config(_))));
    }
}
