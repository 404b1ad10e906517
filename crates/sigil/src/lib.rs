//! # Sigil
//!
//! The message-to-invocation pipeline of a chat bot command framework.
//!
//! ## Overview
//!
//! ```text
//! message ──▶ prefix ──▶ command lookup ──▶ preconditions ──▶ lexer ──▶ Args ──▶ Command::run
//!            mention      name / alias       global, then      flags,     pick, rest,
//!            regex                           the command's     options    repeat, peek
//!            source                          and/or tree
//! ```
//!
//! - **Core** ([`core`]): error taxonomy, identifiers, the [`Message`](prelude::Message) trait
//! - **Framework** ([`framework`]): prefix resolver, precondition trees, lexer,
//!   argument parsing, stores and the dispatcher
//! - **Runtime** ([`runtime`]): configuration, logging and [`SigilClient`](prelude::SigilClient)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sigil::prelude::*;
//!
//! struct Add;
//!
//! #[async_trait]
//! impl Command for Add {
//!     fn name(&self) -> &str {
//!         "add"
//!     }
//!
//!     async fn run(&self, mut args: Args, _ctx: CommandContext) -> DispatchResult<()> {
//!         let numbers = args.repeat::<i64>("integer", RepeatOptions::default().min_count(1)).await?;
//!         println!("{}", numbers.iter().sum::<i64>());
//!         Ok(())
//!     }
//! }
//!
//! let config = load_config()?;
//! init_logging(&config.logging);
//! let client = SigilClient::builder(config).command(Add)?.build()?;
//! client.dispatch(PlainMessage::new("!add 1 2 3").boxed()).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `sigil.toml` (default)
//! - `yaml-config`: load `sigil.yaml`
//! - `json-log`: JSON log output

pub use sigil_core as core;
pub use sigil_framework as framework;
pub use sigil_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use sigil::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use sigil_runtime::config::load_config;
    pub use sigil_runtime::logging::init_from_config as init_logging;
    pub use sigil_runtime::{SigilClient, SigilConfig};

    // Commands and argument parsing
    pub use sigil_framework::{
        ArgOptions, Args, Argument, ArgumentContext, Command, CommandContext, RepeatOptions,
    };

    // Preconditions
    pub use sigil_framework::{
        Precondition, PreconditionEntry, RunCondition, RunMode, precondition_fn,
    };

    // Prefixes and dispatch
    pub use sigil_framework::{DispatchOutcome, Dispatcher, Prefix, PrefixSource, prefix_fn};

    // Errors and messages
    pub use sigil_core::{
        BoxedMessage, DispatchError, DispatchResult, Message, PlainMessage,
        PreconditionContext, SetupError, UserError, identifiers,
    };

    pub use async_trait::async_trait;
}
