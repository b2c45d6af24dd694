//! Background Jobs for the Accolade engine
//!
//! - `definition_refresh`: periodically reloads the definition cache
//!
//! # Usage
//!
//! ```ignore
//! use accolade_engine::jobs::{definition_refresh_task, DefinitionRefreshConfig};
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let config = DefinitionRefreshConfig::from_engine_config(&engine_config);
//! let handle = tokio::spawn(definition_refresh_task(cache.clone(), config, shutdown_rx));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! let metrics = handle.await?;
//! ```

pub mod definition_refresh;

pub use definition_refresh::{
    definition_refresh_task, DefinitionRefreshConfig, DefinitionRefreshMetrics,
    DefinitionRefreshSnapshot,
};
