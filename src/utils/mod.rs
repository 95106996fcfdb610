//! Configuration utilities.

/// `ragkit.toml` loading, environment overrides and validation.
pub mod toml_config;

pub use toml_config::{ConfigError, RagConfig};
