//! The argument parser handed to command handlers.

use std::any::TypeId;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{trace, warn};

use sigil_core::{
    BoxedMessage, DispatchError, DispatchResult, Message, SetupError, UserError, identifiers,
};

use crate::argument::{ArgOptions, Argument, ArgumentStore, ErasedArgument, output_name};
use crate::lexer::Parameters;

/// Options for [`Args::repeat`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatOptions {
    /// Upper bound on collected values; `None` collects until failure.
    pub times: Option<usize>,
    /// Fewer values than this is a failure. Zero by default, so an empty
    /// result is a success.
    pub min_count: usize,
    pub argument: ArgOptions,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self {
            times: None,
            min_count: 0,
            argument: ArgOptions::default(),
        }
    }
}

impl RepeatOptions {
    pub fn times(mut self, times: usize) -> Self {
        self.times = Some(times);
        self
    }

    pub fn min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn argument(mut self, argument: ArgOptions) -> Self {
        self.argument = argument;
        self
    }
}

/// A resumable cursor over the positional parameters of one invocation.
///
/// Every typed read goes through an [`Argument`]. Reads that fail leave the
/// cursor where it was, so callers may retry the same token as another type:
///
/// ```rust,ignore
/// let target = match args.pick::<u64>("snowflake", ArgOptions::default()).await {
///     Ok(id) => Target::User(id),
///     Err(_) => Target::Name(args.pick::<String>("string", ArgOptions::default()).await?),
/// };
/// ```
///
/// Flags and options are read with [`get_flags`](Self::get_flags) and
/// [`get_option`](Self::get_option) and never move the cursor.
pub struct Args {
    message: BoxedMessage,
    command: String,
    parameters: Parameters,
    store: Arc<ArgumentStore>,
    position: usize,
    states: Vec<usize>,
}

impl Args {
    pub fn new(
        message: BoxedMessage,
        command: impl Into<String>,
        parameters: Parameters,
        store: Arc<ArgumentStore>,
    ) -> Self {
        Self {
            message,
            command: command.into(),
            parameters,
            store,
            position: 0,
            states: Vec::new(),
        }
    }

    pub fn message(&self) -> &dyn Message {
        &*self.message
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Index of the next unread positional token.
    pub fn position(&self) -> usize {
        self.position
    }

    /// `true` once every positional token has been consumed.
    pub fn finished(&self) -> bool {
        self.position >= self.parameters.len()
    }

    // ─── Typed reads ──────────────────────────────────────────────────────────

    /// Resolves the next token with the argument registered as `name`.
    ///
    /// Advances by one token on success only.
    ///
    /// # Errors
    ///
    /// - `argsUnavailable` if `name` is not registered.
    /// - `argsMissing` if no token is left.
    /// - The argument's own error if it rejects the token.
    /// - [`SetupError::ArgumentTypeMismatch`] if the argument does not
    ///   produce `T`.
    pub async fn pick<T: Send + 'static>(
        &mut self,
        name: &str,
        options: ArgOptions,
    ) -> DispatchResult<T> {
        let argument = self.lookup::<T>(name)?;
        let Some(token) = self.parameters.get(self.position) else {
            return Err(missing());
        };

        let value = self
            .run_erased::<T>(&argument, name, &token.value, options)
            .await?;
        self.position += 1;
        Ok(value)
    }

    /// Like [`pick`](Self::pick), with an unregistered argument instance.
    pub async fn pick_with<A: Argument>(
        &mut self,
        argument: &A,
        options: ArgOptions,
    ) -> DispatchResult<A::Output> {
        let Some(token) = self.parameters.get(self.position) else {
            return Err(missing());
        };

        let ctx = options.context(&*self.message, &self.command);
        let value = argument.run(&token.value, &ctx).await?;
        self.position += 1;
        Ok(value)
    }

    /// Resolves all remaining tokens as a single parameter.
    ///
    /// The tokens are joined with the whitespace that separated them in the
    /// input, then trimmed. Consumes everything on success; nothing on
    /// failure.
    pub async fn rest<T: Send + 'static>(
        &mut self,
        name: &str,
        options: ArgOptions,
    ) -> DispatchResult<T> {
        let argument = self.lookup::<T>(name)?;
        if self.finished() {
            return Err(missing());
        }

        let joined = self.remaining_text();
        let value = self
            .run_erased::<T>(&argument, name, &joined, options)
            .await?;
        self.position = self.parameters.len();
        Ok(value)
    }

    /// Picks repeatedly until `times` values are collected, a token fails to
    /// resolve, or the tokens run out.
    ///
    /// Collecting fewer than `min_count` values is a failure: the cursor is
    /// put back and the error that stopped collection (or `argsMissing`) is
    /// returned.
    pub async fn repeat<T: Send + 'static>(
        &mut self,
        name: &str,
        options: RepeatOptions,
    ) -> DispatchResult<Vec<T>> {
        let argument = self.lookup::<T>(name)?;
        let limit = options.times.unwrap_or(usize::MAX);
        let start = self.position;
        let mut values = Vec::new();
        let mut stopped_by = None;

        while values.len() < limit {
            let Some(token) = self.parameters.get(self.position) else {
                break;
            };
            let resolved = self
                .run_erased::<T>(&argument, name, &token.value, options.argument)
                .await;
            match resolved {
                Ok(value) => {
                    values.push(value);
                    self.position += 1;
                }
                Err(DispatchError::User(err)) => {
                    stopped_by = Some(err);
                    break;
                }
                Err(err) => {
                    self.position = start;
                    return Err(err);
                }
            }
        }

        if values.len() < options.min_count {
            self.position = start;
            return Err(stopped_by.map_or_else(missing, DispatchError::from));
        }

        trace!(argument = name, count = values.len(), "Repeat collected values");
        Ok(values)
    }

    /// Picks without moving the cursor.
    pub async fn peek<T: Send + 'static>(
        &mut self,
        name: &str,
        options: ArgOptions,
    ) -> DispatchResult<T> {
        self.save();
        let result = self.pick(name, options).await;
        self.restore();
        result
    }

    /// Runs `op` and then puts the cursor back, so that composite reads can
    /// be looked ahead:
    ///
    /// ```rust,ignore
    /// let ids = args
    ///     .peek_with(|args| args.repeat::<u64>("snowflake", RepeatOptions::default()).boxed())
    ///     .await?;
    /// ```
    ///
    /// The state stack is put back to its depth before `op`, whatever
    /// saves or restores `op` left unbalanced.
    pub async fn peek_with<R, F>(&mut self, op: F) -> R
    where
        F: for<'b> FnOnce(&'b mut Args) -> BoxFuture<'b, R>,
    {
        let position = self.position;
        let states = self.states.clone();
        let result = op(self).await;
        self.states = states;
        self.position = position;
        result
    }

    // ─── Raw reads ────────────────────────────────────────────────────────────

    /// Returns the next token verbatim and advances past it.
    pub fn next_raw(&mut self) -> Option<String> {
        let token = self.parameters.get(self.position)?;
        self.position += 1;
        Some(token.value.clone())
    }

    /// Maps the next token with `mapper`, advancing only if it returns
    /// `Some`.
    pub fn next_maybe<T>(&mut self, mapper: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let token = self.parameters.get(self.position)?;
        let value = mapper(&token.value)?;
        self.position += 1;
        Some(value)
    }

    // ─── Cursor state ─────────────────────────────────────────────────────────

    /// Pushes the current position onto the state stack.
    pub fn save(&mut self) {
        self.states.push(self.position);
    }

    /// Pops the last saved position and moves back to it. Does nothing if
    /// nothing was saved.
    pub fn restore(&mut self) {
        if let Some(position) = self.states.pop() {
            self.position = position;
        }
    }

    /// Moves back to the first token. The state stack is left alone.
    pub fn start(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    // ─── Flags & options ──────────────────────────────────────────────────────

    /// `true` if any of `keys` was given as a flag.
    pub fn get_flags(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.parameters.has_flag(key))
    }

    /// The value of the first of `keys` that was given as an option. If that
    /// option was repeated, the last occurrence wins.
    pub fn get_option(&self, keys: &[&str]) -> Option<&str> {
        self.get_options(keys)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value of the first of `keys` that was given as an option.
    pub fn get_options(&self, keys: &[&str]) -> Option<&[String]> {
        keys.iter()
            .find_map(|key| self.parameters.option_values(key))
    }

    // ─── Internals ────────────────────────────────────────────────────────────

    fn lookup<T: 'static>(&self, name: &str) -> DispatchResult<Arc<dyn ErasedArgument>> {
        let Some(argument) = self.store.get(name) else {
            warn!(argument = name, command = %self.command, "Argument is not registered");
            return Err(UserError::new(
                identifiers::ARGS_UNAVAILABLE,
                format!("The argument \"{name}\" was not found."),
            )
            .with_context(json!({ "argument": name }))
            .into());
        };

        if argument.output_type_id() != TypeId::of::<T>() {
            return Err(mismatch::<T>(name));
        }
        Ok(Arc::clone(argument))
    }

    async fn run_erased<T: Send + 'static>(
        &self,
        argument: &Arc<dyn ErasedArgument>,
        name: &str,
        parameter: &str,
        options: ArgOptions,
    ) -> DispatchResult<T> {
        let ctx = options.context(&*self.message, &self.command);
        let value = argument.run_erased(parameter, &ctx).await?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| mismatch::<T>(name))
    }

    fn remaining_text(&self) -> String {
        let mut joined = String::new();
        for token in &self.parameters.ordered()[self.position..] {
            joined.push_str(&token.value);
            joined.push_str(&token.trailing);
        }
        joined.trim().to_string()
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("command", &self.command)
            .field("parameters", &self.parameters)
            .field("position", &self.position)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

fn missing() -> DispatchError {
    UserError::new(identifiers::ARGS_MISSING, "There are no more arguments.").into()
}

fn mismatch<T>(name: &str) -> DispatchError {
    SetupError::ArgumentTypeMismatch {
        argument: name.to_string(),
        expected: output_name::<T>(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentContext;
    use crate::lexer::{Accept, Lexer, LexerOptions};
    use async_trait::async_trait;
    use futures::FutureExt;
    use sigil_core::PlainMessage;

    fn parse(input: &str) -> Args {
        let lexer = Lexer::new(
            LexerOptions::default()
                .flags(Accept::All(true))
                .options(Accept::All(true)),
        );
        Args::new(
            PlainMessage::new(input).boxed(),
            "test",
            lexer.lex(input),
            Arc::new(ArgumentStore::with_defaults()),
        )
    }

    fn opts() -> ArgOptions {
        ArgOptions::default()
    }

    #[tokio::test]
    async fn test_pick_advances_on_success() {
        let mut args = parse("1 2");
        assert_eq!(args.pick::<i64>("integer", opts()).await.unwrap(), 1);
        assert_eq!(args.position(), 1);
        assert_eq!(args.pick::<i64>("integer", opts()).await.unwrap(), 2);
        assert!(args.finished());
    }

    #[tokio::test]
    async fn test_pick_failure_keeps_position() {
        let mut args = parse("abc 2");
        let err = args.pick::<i64>("integer", opts()).await.unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGUMENT_INTEGER));
        assert_eq!(args.position(), 0);

        // the same token can be retried as another type
        assert_eq!(args.pick::<String>("string", opts()).await.unwrap(), "abc");
        assert_eq!(args.position(), 1);
    }

    #[tokio::test]
    async fn test_pick_missing() {
        let mut args = parse("");
        let err = args.pick::<String>("string", opts()).await.unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGS_MISSING));
    }

    #[tokio::test]
    async fn test_unavailable_is_reported_before_missing() {
        let mut args = parse("");
        let err = args.pick::<String>("colour", opts()).await.unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGS_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_setup_error() {
        let mut args = parse("5");
        let err = args.pick::<u32>("integer", opts()).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Setup(SetupError::ArgumentTypeMismatch { .. })
        ));
        assert_eq!(args.position(), 0);
    }

    #[tokio::test]
    async fn test_pick_with_custom_argument() {
        struct Upper;

        #[async_trait]
        impl Argument for Upper {
            type Output = String;

            fn name(&self) -> &str {
                "upper"
            }

            async fn run(&self, parameter: &str, _ctx: &ArgumentContext<'_>) -> DispatchResult<String> {
                Ok(parameter.to_uppercase())
            }
        }

        let mut args = parse("shout");
        assert_eq!(args.pick_with(&Upper, opts()).await.unwrap(), "SHOUT");
        assert!(args.finished());
    }

    #[tokio::test]
    async fn test_rest_preserves_spacing() {
        let mut args = parse("first  second\tthird ");
        args.pick::<String>("string", opts()).await.unwrap();
        let rest = args.rest::<String>("string", opts()).await.unwrap();
        assert_eq!(rest, "second\tthird");
        assert!(args.finished());
    }

    #[tokio::test]
    async fn test_rest_failure_consumes_nothing() {
        let mut args = parse("a b c");
        let err = args
            .rest::<String>("string", ArgOptions::new().max(3.0))
            .await
            .unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGUMENT_STRING_TOO_LONG));
        assert_eq!(args.position(), 0);
    }

    #[tokio::test]
    async fn test_rest_missing() {
        let mut args = parse("");
        let err = args.rest::<String>("string", opts()).await.unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGS_MISSING));
    }

    #[tokio::test]
    async fn test_repeat_upper_bound() {
        let mut args = parse("1 2 3 4");
        let values = args
            .repeat::<i64>("integer", RepeatOptions::default().times(2))
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(args.position(), 2);
        assert_eq!(args.pick::<i64>("integer", opts()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_repeat_stops_at_first_failure() {
        let mut args = parse("1 2 x 4");
        let values = args
            .repeat::<i64>("integer", RepeatOptions::default())
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(args.next_raw().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_repeat_empty_is_success() {
        let mut args = parse("x");
        let values = args
            .repeat::<i64>("integer", RepeatOptions::default())
            .await
            .unwrap();
        assert!(values.is_empty());
        assert_eq!(args.position(), 0);

        let mut args = parse("");
        assert!(
            args.repeat::<i64>("integer", RepeatOptions::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_repeat_below_minimum() {
        let mut args = parse("1 x");
        let err = args
            .repeat::<i64>("integer", RepeatOptions::default().min_count(2))
            .await
            .unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGUMENT_INTEGER));
        assert_eq!(args.position(), 0);

        let mut args = parse("1");
        let err = args
            .repeat::<i64>("integer", RepeatOptions::default().min_count(2))
            .await
            .unwrap_err();
        assert_eq!(err.identifier(), Some(identifiers::ARGS_MISSING));
    }

    #[tokio::test]
    async fn test_peek_then_pick_round_trip() {
        let mut args = parse("7 8");
        let peeked = args.peek::<i64>("integer", opts()).await.unwrap();
        assert_eq!(args.position(), 0);
        let picked = args.pick::<i64>("integer", opts()).await.unwrap();
        assert_eq!(peeked, picked);
        assert_eq!(args.position(), 1);
    }

    #[tokio::test]
    async fn test_peek_restores_on_failure() {
        let mut args = parse("x");
        assert!(args.peek::<i64>("integer", opts()).await.is_err());
        assert_eq!(args.position(), 0);
    }

    #[tokio::test]
    async fn test_peek_with_composite() {
        let mut args = parse("1 2 3 done");
        let values = args
            .peek_with(|args| {
                args.repeat::<i64>("integer", RepeatOptions::default())
                    .boxed()
            })
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(args.position(), 0);
    }

    #[tokio::test]
    async fn test_peek_with_unbalanced_saves() {
        let mut args = parse("a b c");
        args.save();
        args.peek_with(|args| {
            async move {
                args.save();
                args.next_raw();
                args.save();
                args.next_raw();
            }
            .boxed()
        })
        .await;
        assert_eq!(args.position(), 0);
        args.next_raw();
        args.restore();
        assert_eq!(args.position(), 0);
    }

    #[tokio::test]
    async fn test_peek_with_extra_restores() {
        let mut args = parse("a b c d");
        args.next_raw();
        args.save(); // at 1
        args.next_raw();
        let before = args.position();
        args.peek_with(|args| {
            async move {
                args.restore();
                args.restore();
            }
            .boxed()
        })
        .await;
        assert_eq!(args.position(), before);

        // the caller's save survives
        args.restore();
        assert_eq!(args.position(), 1);
    }

    #[test]
    fn test_save_restore_is_lifo() {
        let mut args = parse("a b c d");
        args.next_raw();
        args.save(); // at 1
        args.next_raw();
        args.save(); // at 2
        args.next_raw();
        args.restore();
        assert_eq!(args.position(), 2);
        args.restore();
        assert_eq!(args.position(), 1);
    }

    #[test]
    fn test_restore_on_empty_stack_is_noop() {
        let mut args = parse("a b");
        args.next_raw();
        args.restore();
        assert_eq!(args.position(), 1);
    }

    #[test]
    fn test_next_raw_and_next_maybe() {
        let mut args = parse("12 word");
        assert_eq!(args.next_maybe(|s| s.parse::<u8>().ok()), Some(12));
        assert_eq!(args.next_maybe(|s| s.parse::<u8>().ok()), None);
        assert_eq!(args.position(), 1);
        assert_eq!(args.next_raw().as_deref(), Some("word"));
        assert_eq!(args.next_raw(), None);
        assert!(args.finished());
    }

    #[test]
    fn test_start_rewinds() {
        let mut args = parse("a b");
        args.next_raw();
        args.next_raw();
        assert_eq!(args.start().next_raw().as_deref(), Some("a"));
    }

    #[test]
    fn test_flags_and_options_do_not_move_cursor() {
        let args = parse("--silent --mode=fast --tag=a --tag=b target");
        assert!(args.get_flags(&["quiet", "silent"]));
        assert!(!args.get_flags(&["loud"]));
        assert_eq!(args.get_option(&["m", "mode"]), Some("fast"));
        assert_eq!(args.get_option(&["tag"]), Some("b"));
        assert_eq!(
            args.get_options(&["missing", "tag"]),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(args.get_option(&["nope"]), None);
        assert_eq!(args.position(), 0);
        assert_eq!(args.parameters().len(), 1);
    }

    #[test]
    fn test_get_options_first_key_wins() {
        let args = parse("--a=1 --b=2");
        assert_eq!(args.get_option(&["b", "a"]), Some("2"));
        assert_eq!(args.get_option(&["a", "b"]), Some("1"));
    }
}
