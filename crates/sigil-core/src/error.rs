//! Unified error types for the Sigil dispatch pipeline.
//!
//! Failures fall into three families:
//!
//! - [`UserError`]: bad or missing input, or a failed precondition. Always
//!   safe to show to whoever issued the command.
//! - [`SetupError`]: a mistake made by the command author (unknown check,
//!   vacuous `or` container, ...). Raised at registration time whenever the
//!   mistake can be detected there.
//! - Upstream failures: errors coming out of callbacks that perform I/O,
//!   carried verbatim as a [`BoxError`].
//!
//! All three are folded into [`DispatchError`], the error half of every
//! [`DispatchResult`].

use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

/// A boxed, thread-safe error coming from outside the pipeline.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// User Errors
// =============================================================================

/// What produced a [`UserError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserErrorKind {
    /// Raised directly by user code.
    Generic,
    /// Raised while resolving an argument.
    Argument {
        /// Name of the argument type that rejected the parameter.
        argument: String,
        /// The raw parameter that failed to resolve.
        parameter: String,
    },
    /// Raised by a precondition check.
    Precondition {
        /// Name of the precondition that denied the invocation.
        precondition: String,
    },
}

/// An error caused by the invoking user rather than by the bot's setup.
///
/// The `identifier` is stable and meant for matching and localisation; the
/// `message` is a human-readable fallback.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UserError {
    identifier: Cow<'static, str>,
    message: String,
    context: Value,
    kind: UserErrorKind,
}

impl UserError {
    /// Creates a generic user error.
    pub fn new(identifier: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
            context: Value::Null,
            kind: UserErrorKind::Generic,
        }
    }

    /// Creates an argument error for `parameter`, rejected by `argument`.
    pub fn argument(
        argument: impl Into<String>,
        parameter: impl Into<String>,
        identifier: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
            context: Value::Null,
            kind: UserErrorKind::Argument {
                argument: argument.into(),
                parameter: parameter.into(),
            },
        }
    }

    /// Creates a precondition error. The identifier defaults to the
    /// precondition's name; override it with [`with_identifier`](Self::with_identifier).
    pub fn precondition(precondition: impl Into<String>, message: impl Into<String>) -> Self {
        let precondition = precondition.into();
        Self {
            identifier: Cow::Owned(precondition.clone()),
            message: message.into(),
            context: Value::Null,
            kind: UserErrorKind::Precondition { precondition },
        }
    }

    /// Replaces the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<Cow<'static, str>>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Attaches extra data for whoever renders the error.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn kind(&self) -> &UserErrorKind {
        &self.kind
    }

    /// Returns `true` if this error carries the given identifier.
    pub fn is(&self, identifier: &str) -> bool {
        self.identifier == identifier
    }

    /// The raw parameter, for argument errors.
    pub fn parameter(&self) -> Option<&str> {
        match &self.kind {
            UserErrorKind::Argument { parameter, .. } => Some(parameter),
            _ => None,
        }
    }

    /// The argument type name, for argument errors.
    pub fn argument_name(&self) -> Option<&str> {
        match &self.kind {
            UserErrorKind::Argument { argument, .. } => Some(argument),
            _ => None,
        }
    }
}

// =============================================================================
// Setup Errors
// =============================================================================

/// A configuration mistake made by the command author.
///
/// These abort registration instead of degrading silently at invocation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A precondition tree references a name that is not registered.
    #[error("unknown precondition '{0}'")]
    UnknownPrecondition(String),

    /// An `or` container was built with no entries.
    #[error("an 'or' precondition container needs at least one entry")]
    EmptyOrContainer,

    /// A precondition literal had an unusable shape.
    #[error("malformed precondition entry: {0}")]
    MalformedPrecondition(String),

    /// A registered argument produces a different type than requested.
    #[error("argument '{argument}' does not produce values of type '{expected}'")]
    ArgumentTypeMismatch {
        /// The argument type name.
        argument: String,
        /// The Rust type the caller asked for.
        expected: &'static str,
    },

    /// The configured regex prefix does not compile.
    #[error("invalid regex prefix '{pattern}': {reason}")]
    InvalidRegexPrefix {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A command name or alias is not registered.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A name or alias was registered twice in the same store.
    #[error("duplicate {kind} '{name}'")]
    Duplicate {
        /// Which store rejected the name.
        kind: &'static str,
        /// The clashing name.
        name: String,
    },
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// The error type returned by every fallible pipeline operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The invoking user supplied bad input or was denied.
    #[error(transparent)]
    User(#[from] UserError),

    /// The command was set up incorrectly.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// A callback performing I/O failed; passed through untouched.
    #[error("upstream failure: {0}")]
    Upstream(#[source] BoxError),
}

impl DispatchError {
    /// Wraps an error from an I/O callback.
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        Self::Upstream(err.into())
    }

    /// Returns the user error, if this is one.
    pub fn as_user(&self) -> Option<&UserError> {
        match self {
            Self::User(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the user error identifier, if this is a user error.
    pub fn identifier(&self) -> Option<&str> {
        self.as_user().map(UserError::identifier)
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

/// Result type for pipeline operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers;

    #[test]
    fn test_precondition_identifier_defaults_to_name() {
        let err = UserError::precondition("GuildOnly", "guilds only");
        assert_eq!(err.identifier(), "GuildOnly");
        assert_eq!(
            err.kind(),
            &UserErrorKind::Precondition {
                precondition: "GuildOnly".into()
            }
        );

        let err = err.with_identifier("preconditionGuildOnly");
        assert!(err.is("preconditionGuildOnly"));
    }

    #[test]
    fn test_argument_error_accessors() {
        let err = UserError::argument(
            "integer",
            "abc",
            identifiers::ARGUMENT_INTEGER,
            "The argument did not resolve to an integer.",
        );
        assert_eq!(err.parameter(), Some("abc"));
        assert_eq!(err.argument_name(), Some("integer"));
        assert_eq!(err.to_string(), "The argument did not resolve to an integer.");
    }

    #[test]
    fn test_dispatch_error_classification() {
        let user: DispatchError = UserError::new(identifiers::ARGS_MISSING, "missing").into();
        assert!(user.is_user());
        assert_eq!(user.identifier(), Some(identifiers::ARGS_MISSING));

        let setup: DispatchError = SetupError::EmptyOrContainer.into();
        assert!(setup.is_setup());
        assert_eq!(setup.identifier(), None);

        let io = std::io::Error::other("lookup failed");
        let upstream = DispatchError::upstream(io);
        assert!(matches!(upstream, DispatchError::Upstream(_)));
        assert_eq!(upstream.to_string(), "upstream failure: lookup failed");
    }
}
