//! # Sigil Core
//!
//! Shared building blocks for every stage of the Sigil dispatch pipeline:
//!
//! - [`error`]: the three-way error taxonomy ([`UserError`], [`SetupError`],
//!   upstream failures) folded into [`DispatchError`]
//! - [`identifiers`]: well-known [`UserError`] identifiers
//! - [`message`]: the [`Message`] trait the host object model implements
//! - [`context`]: the per-dispatch [`PreconditionContext`] map
//!
//! Nothing in this crate performs I/O or spawns tasks; it only defines the
//! vocabulary the framework layer speaks.

pub mod context;
pub mod error;
pub mod identifiers;
pub mod message;

pub use context::PreconditionContext;
pub use error::{BoxError, DispatchError, DispatchResult, SetupError, UserError, UserErrorKind};
pub use message::{BoxedMessage, Message, PlainMessage};
