//! Infrastructure layer: persistence adapters, availability upkeep, config.

pub mod config;
pub mod consistency;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use consistency::{ConsistencyUpdater, RecomputeOutcome};
pub use store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore, StoreError, StoreResult};
