//! Well-known identifiers carried by [`UserError`](crate::UserError).
//!
//! Identifiers are plain strings so that user code can mint its own; the
//! constants below are the ones produced by the framework itself. Match on
//! them with [`UserError::is`](crate::UserError::is).

// ─── Arguments ────────────────────────────────────────────────────────────────

pub const ARGUMENT_BOOLEAN: &str = "boolean";
pub const ARGUMENT_FLOAT: &str = "float";
pub const ARGUMENT_FLOAT_TOO_SMALL: &str = "floatTooSmall";
pub const ARGUMENT_FLOAT_TOO_BIG: &str = "floatTooBig";
pub const ARGUMENT_HYPERLINK: &str = "hyperlink";
pub const ARGUMENT_INTEGER: &str = "integer";
pub const ARGUMENT_INTEGER_TOO_SMALL: &str = "integerTooSmall";
pub const ARGUMENT_INTEGER_TOO_BIG: &str = "integerTooBig";
pub const ARGUMENT_NUMBER: &str = "number";
pub const ARGUMENT_NUMBER_TOO_SMALL: &str = "numberTooSmall";
pub const ARGUMENT_NUMBER_TOO_BIG: &str = "numberTooBig";
pub const ARGUMENT_SNOWFLAKE: &str = "snowflake";
pub const ARGUMENT_STRING_TOO_SHORT: &str = "stringTooShort";
pub const ARGUMENT_STRING_TOO_LONG: &str = "stringTooLong";

// ─── Parser ───────────────────────────────────────────────────────────────────

/// The requested argument type is not registered.
pub const ARGS_UNAVAILABLE: &str = "argsUnavailable";
/// There is no positional token left to consume.
pub const ARGS_MISSING: &str = "argsMissing";

// ─── Commands & preconditions ─────────────────────────────────────────────────

pub const COMMAND_DISABLED: &str = "commandDisabled";

/// Produced by an `or` container that had nothing to evaluate.
pub const PRECONDITION_NONE_PASSED: &str = "preconditionNonePassed";
