//! Message dispatching.
//!
//! The [`Dispatcher`] drives a message through the whole pipeline:
//!
//! 1. resolve the prefix ([`PrefixResolver`]);
//! 2. split off the command name and look the command up;
//! 3. run the global preconditions, then the command's own tree;
//! 4. lex the parameters and hand an [`Args`] to the command.
//!
//! Every stage that can end the dispatch early maps to a
//! [`DispatchOutcome`] variant. Only setup and upstream failures surface as
//! errors.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, Level, debug, span, trace, warn};

use sigil_core::{
    BoxedMessage, DispatchError, DispatchResult, Message, PreconditionContext, UserError,
    identifiers,
};

use crate::args::Args;
use crate::argument::ArgumentStore;
use crate::command::{CommandContext, CommandEntry, CommandStore};
use crate::precondition::PreconditionStore;
use crate::prefix::{MatchedPrefix, PrefixOutcome, PrefixResolver};

/// A message split into prefix, command name and parameter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessage {
    MentionOnly,
    NonePrefixed,
    Prefixed {
        prefix: MatchedPrefix,
        /// Empty if nothing but whitespace followed the prefix.
        name: String,
        /// Everything after the name, trimmed.
        parameters: String,
    },
}

/// How a dispatch ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The message was nothing but the bot's mention.
    MentionOnly,
    /// No prefix matched; the message is not for us.
    NonePrefixed,
    /// A prefix matched but no command name followed it.
    UnknownCommandName { prefix: MatchedPrefix },
    /// No command is registered under `name`.
    UnknownCommand { prefix: MatchedPrefix, name: String },
    /// The command is disabled or a precondition denied the invocation.
    Denied { command: String, error: UserError },
    /// The command ran; `result` is what it returned.
    Finished {
        command: String,
        result: DispatchResult<()>,
    },
}

struct Inner {
    prefix: PrefixResolver,
    commands: CommandStore,
    preconditions: PreconditionStore,
    arguments: Arc<ArgumentStore>,
}

/// Routes messages to commands. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates a dispatcher from already validated stores.
    ///
    /// Command trees are not checked against `preconditions` here; hosts
    /// normally build dispatchers through a client builder that does.
    pub fn new(
        prefix: PrefixResolver,
        commands: CommandStore,
        preconditions: PreconditionStore,
        arguments: ArgumentStore,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                prefix,
                commands,
                preconditions,
                arguments: Arc::new(arguments),
            }),
        }
    }

    pub fn commands(&self) -> &CommandStore {
        &self.inner.commands
    }

    pub fn preconditions(&self) -> &PreconditionStore {
        &self.inner.preconditions
    }

    pub fn arguments(&self) -> &ArgumentStore {
        &self.inner.arguments
    }

    pub fn prefix_resolver(&self) -> &PrefixResolver {
        &self.inner.prefix
    }

    /// Resolves the prefix and splits off the command name.
    pub async fn parse_message(&self, message: &dyn Message) -> DispatchResult<ParsedMessage> {
        let prefix = match self.inner.prefix.resolve(message).await? {
            PrefixOutcome::MentionOnly => return Ok(ParsedMessage::MentionOnly),
            PrefixOutcome::NonePrefixed => return Ok(ParsedMessage::NonePrefixed),
            PrefixOutcome::Prefixed(prefix) => prefix,
        };

        let content = message.content();
        let body = content.get(prefix.len()..).unwrap_or_default().trim();
        let (name, parameters) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));

        Ok(ParsedMessage::Prefixed {
            prefix,
            name: name.to_string(),
            parameters: parameters.trim().to_string(),
        })
    }

    /// Runs `message` through the pipeline.
    pub async fn dispatch(&self, message: BoxedMessage) -> DispatchResult<DispatchOutcome> {
        let span = span!(Level::DEBUG, "dispatch", author = message.author_id().unwrap_or("-"));
        self.dispatch_inner(message).instrument(span).await
    }

    async fn dispatch_inner(&self, message: BoxedMessage) -> DispatchResult<DispatchOutcome> {
        let (prefix, name, parameters) = match self.parse_message(&*message).await? {
            ParsedMessage::MentionOnly => {
                trace!("Bare mention");
                return Ok(DispatchOutcome::MentionOnly);
            }
            ParsedMessage::NonePrefixed => return Ok(DispatchOutcome::NonePrefixed),
            ParsedMessage::Prefixed {
                prefix,
                name,
                parameters,
            } => (prefix, name, parameters),
        };

        if name.is_empty() {
            debug!(prefix = prefix.as_str(), "Prefix without a command name");
            return Ok(DispatchOutcome::UnknownCommandName { prefix });
        }

        let Some(entry) = self.inner.commands.get(&name).cloned() else {
            debug!(command = %name, "Unknown command");
            return Ok(DispatchOutcome::UnknownCommand { prefix, name });
        };
        let command = entry.name().to_string();

        if let Err(error) = self.check(&entry, &*message).await {
            return match error {
                DispatchError::User(error) => {
                    debug!(command = %command, identifier = error.identifier(), "Command denied");
                    Ok(DispatchOutcome::Denied { command, error })
                }
                other => {
                    warn!(command = %command, error = %other, "Precondition evaluation failed");
                    Err(other)
                }
            };
        }

        let args = Args::new(
            Arc::clone(&message),
            command.clone(),
            entry.lexer().lex(&parameters),
            Arc::clone(&self.inner.arguments),
        );
        let ctx = CommandContext {
            message,
            prefix,
            command_name: name,
        };

        debug!(command = %command, "Running command");
        let result = entry.command().run(args, ctx).await;
        if let Err(err) = &result {
            debug!(command = %command, error = %err, "Command returned an error");
        }
        Ok(DispatchOutcome::Finished { command, result })
    }

    /// Runs the enabled check, the global preconditions and the command's
    /// tree, in that order. Each dispatch gets a fresh context.
    async fn check(&self, entry: &CommandEntry, message: &dyn Message) -> DispatchResult<()> {
        if !entry.is_enabled() {
            return Err(UserError::new(
                identifiers::COMMAND_DISABLED,
                "This command is disabled.",
            )
            .into());
        }

        let ctx = PreconditionContext::new();
        self.inner
            .preconditions
            .run_globals(message, entry.name(), &ctx)
            .await?;
        entry
            .preconditions()
            .run(&self.inner.preconditions, message, entry.name(), &ctx)
            .await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.inner.prefix)
            .field("commands", &self.inner.commands)
            .field("preconditions", &self.inner.preconditions)
            .field("arguments", &self.inner.arguments)
            .finish()
    }
}

impl Service<BoxedMessage> for Dispatcher {
    type Response = DispatchOutcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, DispatchResult<DispatchOutcome>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: BoxedMessage) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { dispatcher.dispatch(message).await })
    }
}
