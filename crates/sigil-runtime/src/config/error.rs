//! Configuration error types.

use std::path::PathBuf;

use sigil_core::SetupError;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The sources could not be merged or extracted.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// The regex prefix does not compile.
    #[error("Invalid regex prefix '{pattern}': {reason}")]
    InvalidRegexPrefix { pattern: String, reason: String },

    /// A command's precondition literal does not build into a tree.
    #[error("Invalid preconditions for command '{command}': {source}")]
    InvalidPreconditions {
        command: String,
        #[source]
        source: SetupError,
    },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
