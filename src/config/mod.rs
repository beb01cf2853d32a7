//! Configuration module
//!
//! Configuration types, TOML loading and validation for the adapter.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{load_config, parse_tags};
pub use types::{BackendConfig, BackendMode, Config, MetricsConfig, PoolSettings};
