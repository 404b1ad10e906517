use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use sigil_core::SetupError;

use super::builtin::{
    BooleanArgument, FloatArgument, HyperlinkArgument, IntegerArgument, NumberArgument,
    SnowflakeArgument, StringArgument,
};
use super::{Argument, ErasedArgument};

/// Registry of arguments keyed by name and alias.
#[derive(Clone, Default)]
pub struct ArgumentStore {
    entries: HashMap<String, Arc<dyn ErasedArgument>>,
}

impl ArgumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the built-in arguments.
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        let results = [
            store.register(StringArgument),
            store.register(IntegerArgument),
            store.register(NumberArgument),
            store.register(FloatArgument),
            store.register(BooleanArgument),
            store.register(HyperlinkArgument),
            store.register(SnowflakeArgument),
        ];
        for error in results.into_iter().filter_map(Result::err) {
            warn!(%error, "Skipping built-in argument");
        }
        store
    }

    /// Registers `argument` under its name and aliases.
    ///
    /// Fails without modifying the store if any of them is already taken.
    pub fn register<A: Argument>(&mut self, argument: A) -> Result<(), SetupError> {
        let name = Argument::name(&argument).to_string();
        let keys: Vec<String> = std::iter::once(name.clone())
            .chain(argument.aliases().iter().map(|alias| alias.to_string()))
            .collect();

        if let Some(taken) = keys.iter().find(|key| self.entries.contains_key(*key)) {
            return Err(SetupError::Duplicate {
                kind: "argument",
                name: taken.clone(),
            });
        }

        debug!(argument = %name, aliases = keys.len() - 1, "Registering argument");
        let shared: Arc<dyn ErasedArgument> = Arc::new(argument);
        for key in keys {
            self.entries.insert(key, Arc::clone(&shared));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names and aliases, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<dyn ErasedArgument>> {
        self.entries.get(name)
    }
}

impl std::fmt::Debug for ArgumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ArgumentStore").field("names", &names).finish()
    }
}
