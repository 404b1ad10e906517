//! Client assembly.
//!
//! [`SigilClient::builder`] collects arguments, preconditions and commands,
//! then [`build`](SigilClientBuilder::build) applies the configuration on top
//! and checks everything that can be checked before the first message
//! arrives:
//!
//! 1. the configuration itself ([`validate_config`])
//! 2. per-command overrides from `[commands.<name>]`
//! 3. every command's precondition tree against the registered checks
//! 4. the regex prefix
//!
//! ```rust,ignore
//! let client = SigilClient::builder(load_config()?)
//!     .precondition(GuildOnly)?
//!     .command(Ban)?
//!     .build()?;
//!
//! let outcome = client.dispatch(message).await?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use sigil_core::{BoxedMessage, DispatchResult};
use sigil_framework::{
    Argument, ArgumentStore, Command, CommandStore, DispatchOutcome, Dispatcher, Precondition,
    PreconditionContainer, PreconditionStore, PrefixResolver, PrefixSource,
};

use crate::config::{SigilConfig, validate_config};
use crate::error::RuntimeResult;

/// A configured dispatch pipeline.
#[derive(Debug, Clone)]
pub struct SigilClient {
    config: Arc<SigilConfig>,
    dispatcher: Dispatcher,
}

impl SigilClient {
    /// Starts assembling a client. The built-in arguments are pre-registered.
    pub fn builder(config: SigilConfig) -> SigilClientBuilder {
        let commands = CommandStore::new().default_lexer(config.client.lexer.clone());
        SigilClientBuilder {
            config,
            arguments: ArgumentStore::with_defaults(),
            preconditions: PreconditionStore::new(),
            commands,
            prefix_source: None,
        }
    }

    pub fn config(&self) -> &SigilConfig {
        &self.config
    }

    /// The dispatcher, e.g. to mount as a tower service.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs `message` through the pipeline.
    pub async fn dispatch(&self, message: BoxedMessage) -> DispatchResult<DispatchOutcome> {
        self.dispatcher.dispatch(message).await
    }
}

/// Builder returned by [`SigilClient::builder`].
pub struct SigilClientBuilder {
    config: SigilConfig,
    arguments: ArgumentStore,
    preconditions: PreconditionStore,
    commands: CommandStore,
    prefix_source: Option<Arc<dyn PrefixSource>>,
}

impl SigilClientBuilder {
    /// Registers an argument type next to the built-in ones.
    pub fn argument<A: Argument>(mut self, argument: A) -> RuntimeResult<Self> {
        self.arguments.register(argument)?;
        Ok(self)
    }

    pub fn precondition<P: Precondition>(mut self, precondition: P) -> RuntimeResult<Self> {
        self.preconditions.register(precondition)?;
        Ok(self)
    }

    pub fn command<C: Command>(mut self, command: C) -> RuntimeResult<Self> {
        self.commands.register(command)?;
        Ok(self)
    }

    /// Replaces `client.default_prefix` with a per-message source.
    pub fn prefix_source(mut self, source: impl PrefixSource + 'static) -> Self {
        self.prefix_source = Some(Arc::new(source));
        self
    }

    pub fn build(self) -> RuntimeResult<SigilClient> {
        let Self {
            config,
            arguments,
            preconditions,
            commands,
            prefix_source,
        } = self;

        validate_config(&config)?;
        let client = &config.client;

        let mut commands = commands.case_insensitive(client.case_insensitive_commands)?;
        for (name, overrides) in &config.commands {
            if let Some(entries) = &overrides.preconditions {
                debug!(command = %name, "Overriding preconditions from configuration");
                commands.set_preconditions(name, PreconditionContainer::from_entries(entries)?)?;
            }
            if let Some(enabled) = overrides.enabled {
                commands.set_enabled(name, enabled)?;
            }
        }
        commands.validate(&preconditions)?;

        let source: Arc<dyn PrefixSource> = match prefix_source {
            Some(source) => source,
            None => Arc::new(client.default_prefix.clone().unwrap_or_default()),
        };
        let mut resolver = PrefixResolver::from_shared(source)
            .mention_prefix(client.mention_prefix)
            .case_insensitive(client.case_insensitive_prefixes);
        if let Some(id) = &client.id {
            resolver = resolver.client_id(id.as_str());
        }
        if let Some(pattern) = &client.regex_prefix {
            resolver = resolver.regex_pattern(pattern)?;
        }

        info!(
            commands = commands.len(),
            preconditions = preconditions.len(),
            globals = preconditions.globals().count(),
            "Sigil client ready"
        );

        let dispatcher = Dispatcher::new(resolver, commands, preconditions, arguments);
        Ok(SigilClient {
            config: Arc::new(config),
            dispatcher,
        })
    }
}

impl std::fmt::Debug for SigilClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigilClientBuilder")
            .field("config", &self.config)
            .field("arguments", &self.arguments)
            .field("preconditions", &self.preconditions)
            .field("commands", &self.commands)
            .field("prefix_source", &self.prefix_source.is_some())
            .finish()
    }
}
