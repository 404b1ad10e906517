//! # Sigil Framework
//!
//! The message-to-invocation pipeline of a chat command framework.
//!
//! This layer provides:
//! - Prefix resolution (mentions, a regex prefix, static or per-message prefixes)
//! - Precondition trees with alternating `and`/`or` semantics and sequential or
//!   parallel evaluation
//! - A shell-like lexer and the [`Args`] cursor for typed argument parsing
//! - Stores for arguments, preconditions and commands
//! - A [`Dispatcher`] tying it all together, usable as a tower [`Service`](tower::Service)

pub mod args;
pub mod argument;
pub mod command;
pub mod dispatcher;
pub mod lexer;
pub mod precondition;
pub mod prefix;

pub use args::{Args, RepeatOptions};
pub use argument::{
    ArgOptions, Argument, ArgumentContext, ArgumentStore, BooleanArgument, FloatArgument,
    HyperlinkArgument, IntegerArgument, NumberArgument, SnowflakeArgument, StringArgument,
};
pub use command::{Command, CommandContext, CommandEntry, CommandStore};
pub use dispatcher::{DispatchOutcome, Dispatcher, ParsedMessage};
pub use lexer::{Accept, Lexer, LexerOptions, Parameters, Token};
pub use precondition::{
    Precondition, PreconditionContainer, PreconditionEntry, PreconditionFn, PreconditionStore,
    RunCondition, RunMode, precondition_fn,
};
pub use prefix::{
    MatchedPrefix, Prefix, PrefixFn, PrefixKind, PrefixOutcome, PrefixResolver, PrefixSource,
    prefix_fn,
};
