//! Commands and the store they are looked up in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sigil_core::{BoxedMessage, DispatchResult, SetupError};

use crate::args::Args;
use crate::lexer::{Lexer, LexerOptions};
use crate::precondition::{PreconditionContainer, PreconditionEntry, PreconditionStore};
use crate::prefix::MatchedPrefix;

/// What the handler learns about how it was invoked.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub message: BoxedMessage,
    /// The prefix the message started with.
    pub prefix: MatchedPrefix,
    /// The name or alias the command was invoked by, as typed.
    pub command_name: String,
}

/// A command handler.
///
/// # Example
///
/// ```rust,ignore
/// struct Add;
///
/// #[async_trait]
/// impl Command for Add {
///     fn name(&self) -> &str {
///         "add"
///     }
///
///     fn preconditions(&self) -> Vec<PreconditionEntry> {
///         vec!["GuildOnly".into()]
///     }
///
///     async fn run(&self, mut args: Args, _ctx: CommandContext) -> DispatchResult<()> {
///         let numbers = args.repeat::<i64>("integer", RepeatOptions::default().min_count(1)).await?;
///         println!("{}", numbers.iter().sum::<i64>());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    fn description(&self) -> &str {
        ""
    }

    /// The precondition literal; the top level is an `and`.
    fn preconditions(&self) -> Vec<PreconditionEntry> {
        Vec::new()
    }

    /// How the parameters of this command are lexed. `None` uses the
    /// store's default.
    fn lexer_options(&self) -> Option<LexerOptions> {
        None
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn run(&self, args: Args, ctx: CommandContext) -> DispatchResult<()>;
}

/// A registered command together with everything built for it at
/// registration time.
#[derive(Clone)]
pub struct CommandEntry {
    command: Arc<dyn Command>,
    preconditions: PreconditionContainer,
    lexer: Lexer,
    enabled: bool,
}

impl CommandEntry {
    pub fn name(&self) -> &str {
        self.command.name()
    }

    pub fn command(&self) -> &Arc<dyn Command> {
        &self.command
    }

    pub fn preconditions(&self) -> &PreconditionContainer {
        &self.preconditions
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name())
            .field("preconditions", &self.preconditions)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Registry of commands keyed by name and alias.
#[derive(Clone, Default)]
pub struct CommandStore {
    commands: HashMap<String, Arc<CommandEntry>>,
    /// Lookup key (name or alias, folded if case-insensitive) to name.
    keys: HashMap<String, String>,
    case_insensitive: bool,
    default_lexer: LexerOptions,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables case-insensitive lookup. Existing keys are re-folded.
    pub fn case_insensitive(mut self, enabled: bool) -> Result<Self, SetupError> {
        self.case_insensitive = enabled;
        let keys = std::mem::take(&mut self.keys);
        for (key, name) in keys {
            let folded = self.fold(&key);
            match self.keys.get(&folded) {
                Some(existing) if *existing != name => {
                    return Err(SetupError::Duplicate {
                        kind: "command",
                        name: folded,
                    });
                }
                Some(_) => {}
                None => {
                    self.keys.insert(folded, name);
                }
            }
        }
        Ok(self)
    }

    /// Sets the lexer options used by commands registered afterwards that
    /// don't bring their own.
    pub fn default_lexer(mut self, options: LexerOptions) -> Self {
        self.default_lexer = options;
        self
    }

    /// Registers `command`, building its precondition tree and lexer.
    pub fn register<C: Command>(&mut self, command: C) -> Result<(), SetupError> {
        let preconditions = PreconditionContainer::from_entries(&command.preconditions())?;
        let lexer = Lexer::new(
            command
                .lexer_options()
                .unwrap_or_else(|| self.default_lexer.clone()),
        );
        let enabled = command.enabled();
        self.insert(CommandEntry {
            command: Arc::new(command),
            preconditions,
            lexer,
            enabled,
        })
    }

    fn insert(&mut self, entry: CommandEntry) -> Result<(), SetupError> {
        let name = entry.name().to_string();
        let keys: Vec<String> = std::iter::once(name.as_str())
            .chain(entry.command.aliases().iter().copied())
            .map(|key| self.fold(key))
            .collect();

        if self.commands.contains_key(&name) {
            return Err(SetupError::Duplicate {
                kind: "command",
                name,
            });
        }
        if let Some(taken) = keys.iter().find(|key| self.keys.contains_key(*key)) {
            return Err(SetupError::Duplicate {
                kind: "command",
                name: taken.clone(),
            });
        }

        debug!(command = %name, aliases = keys.len() - 1, "Registering command");
        for key in keys {
            self.keys.insert(key, name.clone());
        }
        self.commands.insert(name, Arc::new(entry));
        Ok(())
    }

    /// Looks a command up by name or alias.
    pub fn get(&self, key: &str) -> Option<&Arc<CommandEntry>> {
        let name = self.keys.get(&self.fold(key))?;
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandEntry>> {
        self.commands.values()
    }

    /// Replaces the precondition tree of command `name`.
    pub fn set_preconditions(
        &mut self,
        name: &str,
        preconditions: PreconditionContainer,
    ) -> Result<(), SetupError> {
        self.entry_mut(name)?.preconditions = preconditions;
        Ok(())
    }

    /// Enables or disables command `name`.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), SetupError> {
        self.entry_mut(name)?.enabled = enabled;
        Ok(())
    }

    /// Checks every command's tree against `store`.
    pub fn validate(&self, store: &PreconditionStore) -> Result<(), SetupError> {
        self.commands
            .values()
            .try_for_each(|entry| entry.preconditions.validate(store))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut CommandEntry, SetupError> {
        let canonical = self
            .keys
            .get(&self.fold(name))
            .cloned()
            .ok_or_else(|| SetupError::UnknownCommand(name.to_string()))?;
        self.commands
            .get_mut(&canonical)
            .map(Arc::make_mut)
            .ok_or_else(|| SetupError::UnknownCommand(name.to_string()))
    }

    fn fold(&self, key: &str) -> String {
        if self.case_insensitive {
            key.to_lowercase()
        } else {
            key.to_string()
        }
    }
}

impl std::fmt::Debug for CommandStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CommandStore")
            .field("commands", &names)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}
