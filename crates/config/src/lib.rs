//! Configuration for the storycast pipeline
//!
//! Supports loading configuration from:
//! - TOML files (`config/default.toml`, then `config/{env}.toml`)
//! - Environment variables (`STORYCAST_` prefix, `__` separator)
//! - Serde field defaults for everything else

pub mod settings;

pub use settings::{
    load_settings, RemoteConfig, RunConfig, Settings, SynthesisBackendKind, SynthesisConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
