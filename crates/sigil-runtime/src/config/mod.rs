//! Configuration module for the Sigil runtime.
//!
//! This module provides figment-based loading and validation of client
//! options, logging settings and per-command overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ClientConfig, CommandConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SigilConfig, SpanEventConfig,
};
pub use validation::validate_config;
