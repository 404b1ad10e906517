//! Typed argument resolution.
//!
//! An [`Argument`] turns one raw parameter into a typed value, or rejects it
//! with a [`UserError`](sigil_core::UserError). Arguments are registered by
//! name in an [`ArgumentStore`] and looked up by the [`Args`](crate::Args)
//! parser.

mod builtin;
mod store;

use std::any::{Any, TypeId, type_name};

use async_trait::async_trait;

use sigil_core::{DispatchResult, Message};

pub use builtin::{
    BooleanArgument, FloatArgument, HyperlinkArgument, IntegerArgument, NumberArgument,
    SnowflakeArgument, StringArgument,
};
pub use store::ArgumentStore;

/// Per-call data handed to [`Argument::run`].
#[derive(Debug, Clone, Copy)]
pub struct ArgumentContext<'a> {
    pub message: &'a dyn Message,
    /// Name of the command being parsed.
    pub command: &'a str,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Whether `minimum`/`maximum` are themselves valid values.
    pub inclusive: bool,
}

/// Options for a single `pick`/`rest`/`peek` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArgOptions {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub inclusive: bool,
}

impl Default for ArgOptions {
    fn default() -> Self {
        Self {
            minimum: None,
            maximum: None,
            inclusive: true,
        }
    }
}

impl ArgOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }

    pub(crate) fn context<'a>(&self, message: &'a dyn Message, command: &'a str) -> ArgumentContext<'a> {
        ArgumentContext {
            message,
            command,
            minimum: self.minimum,
            maximum: self.maximum,
            inclusive: self.inclusive,
        }
    }
}

/// Resolves raw parameters into values of type [`Output`](Self::Output).
///
/// # Example
///
/// ```rust,ignore
/// struct Colour;
///
/// #[async_trait]
/// impl Argument for Colour {
///     type Output = (u8, u8, u8);
///
///     fn name(&self) -> &str {
///         "colour"
///     }
///
///     async fn run(&self, parameter: &str, _ctx: &ArgumentContext<'_>) -> DispatchResult<Self::Output> {
///         parse_hex(parameter).ok_or_else(|| {
///             UserError::argument("colour", parameter, "colour", "Not a colour.").into()
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Argument: Send + Sync + 'static {
    type Output: Send + 'static;

    /// The name the argument is registered and picked under.
    fn name(&self) -> &str;

    /// Additional names resolving to the same argument.
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    async fn run(&self, parameter: &str, ctx: &ArgumentContext<'_>)
    -> DispatchResult<Self::Output>;
}

/// Object-safe form of [`Argument`] stored in the registry.
#[async_trait]
pub(crate) trait ErasedArgument: Send + Sync {
    fn name(&self) -> &str;

    fn output_type_id(&self) -> TypeId;

    async fn run_erased(
        &self,
        parameter: &str,
        ctx: &ArgumentContext<'_>,
    ) -> DispatchResult<Box<dyn Any + Send>>;
}

#[async_trait]
impl<A: Argument> ErasedArgument for A {
    fn name(&self) -> &str {
        Argument::name(self)
    }

    fn output_type_id(&self) -> TypeId {
        TypeId::of::<A::Output>()
    }

    async fn run_erased(
        &self,
        parameter: &str,
        ctx: &ArgumentContext<'_>,
    ) -> DispatchResult<Box<dyn Any + Send>> {
        let value = self.run(parameter, ctx).await?;
        Ok(Box::new(value))
    }
}

/// Name of `T`, for type mismatch errors.
pub(crate) fn output_name<T>() -> &'static str {
    type_name::<T>()
}
