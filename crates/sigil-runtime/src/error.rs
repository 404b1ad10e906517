//! Runtime error types.

use sigil_core::SetupError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling a client.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A store rejected a registration or a command tree is invalid.
    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
