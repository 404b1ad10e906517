//! Preconditions: named checks that gate command execution.
//!
//! Commands declare their checks as a tree of [`PreconditionContainer`]s.
//! The top level is an `and`; each nested list flips to `or` and back, so
//! `["A", ["B", ["C", "D"]]]` reads as `A && (B || (C && D))`.

mod condition;
mod container;
mod store;

use async_trait::async_trait;
use futures::future::BoxFuture;

use sigil_core::{DispatchResult, Message, PreconditionContext};

pub use condition::{RunCondition, RunMode};
pub use container::{PreconditionContainer, PreconditionEntry};
pub use store::PreconditionStore;

/// A named check run before a command.
///
/// Denials are reported as [`UserError::precondition`](sigil_core::UserError::precondition)
/// so the identifier defaults to the check's name.
#[async_trait]
pub trait Precondition: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Global preconditions run before every command, in ascending
    /// position. `None` (the default) makes the check opt-in per command.
    fn position(&self) -> Option<usize> {
        None
    }

    async fn run(
        &self,
        message: &dyn Message,
        command: &str,
        ctx: &PreconditionContext,
    ) -> DispatchResult<()>;
}

/// A [`Precondition`] backed by a closure. Created by [`precondition_fn`].
pub struct PreconditionFn<F> {
    name: String,
    position: Option<usize>,
    check: F,
}

impl<F> PreconditionFn<F> {
    /// Makes the check global, running at `position`.
    pub fn global(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

#[async_trait]
impl<F> Precondition for PreconditionFn<F>
where
    F: for<'a> Fn(&'a dyn Message, &'a str, &'a PreconditionContext) -> BoxFuture<'a, DispatchResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Option<usize> {
        self.position
    }

    async fn run(
        &self,
        message: &dyn Message,
        command: &str,
        ctx: &PreconditionContext,
    ) -> DispatchResult<()> {
        (self.check)(message, command, ctx).await
    }
}

/// Wraps an async closure into a named [`Precondition`].
///
/// ```rust,ignore
/// let owner_only = precondition_fn("OwnerOnly", |message, _command, _ctx| {
///     async move {
///         match message.author_id() {
///             Some(OWNER) => Ok(()),
///             _ => Err(UserError::precondition("OwnerOnly", "Owner only.").into()),
///         }
///     }
///     .boxed()
/// });
/// ```
pub fn precondition_fn<F>(name: impl Into<String>, check: F) -> PreconditionFn<F>
where
    F: for<'a> Fn(&'a dyn Message, &'a str, &'a PreconditionContext) -> BoxFuture<'a, DispatchResult<()>>
        + Send
        + Sync
        + 'static,
{
    PreconditionFn {
        name: name.into(),
        position: None,
        check,
    }
}
