//! Sigil Runtime - configuration, logging and client assembly.
//!
//! This crate provides:
//! - Layered configuration loading with figment (`sigil.toml`, `SIGIL_*`)
//! - Configuration validation, including precondition literals
//! - Logging setup on top of `tracing-subscriber`
//! - [`SigilClient`], which turns a configuration plus registered pieces
//!   into a ready [`Dispatcher`](sigil_framework::Dispatcher)
//!
//! ```rust,ignore
//! use sigil_runtime::{SigilClient, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let client = SigilClient::builder(config)
//!     .precondition(GuildOnly)?
//!     .command(Ping)?
//!     .build()?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;

pub use client::{SigilClient, SigilClientBuilder};
pub use config::{
    ClientConfig, CommandConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig,
    SigilConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for command and precondition implementations.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
