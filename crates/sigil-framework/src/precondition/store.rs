use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use sigil_core::{DispatchResult, Message, PreconditionContext, SetupError};

use super::Precondition;

/// Registry of preconditions keyed by name.
///
/// Preconditions reporting a [`position`](Precondition::position) are also
/// recorded as global and run for every command through
/// [`run_globals`](Self::run_globals).
#[derive(Clone, Default)]
pub struct PreconditionStore {
    entries: HashMap<String, Arc<dyn Precondition>>,
    /// Global precondition names, ordered by position.
    globals: Vec<(usize, String)>,
}

impl PreconditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `precondition` under its name.
    pub fn register<P: Precondition>(&mut self, precondition: P) -> Result<(), SetupError> {
        let name = precondition.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(SetupError::Duplicate {
                kind: "precondition",
                name,
            });
        }

        if let Some(position) = precondition.position() {
            // equal positions keep registration order
            let at = self.globals.partition_point(|(p, _)| *p <= position);
            self.globals.insert(at, (position, name.clone()));
        }

        debug!(precondition = %name, global = precondition.position().is_some(), "Registering precondition");
        self.entries.insert(name, Arc::new(precondition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Precondition>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the global preconditions, in the order they run.
    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(|(_, name)| name.as_str())
    }

    /// Runs every global precondition in order, stopping at the first error.
    pub async fn run_globals(
        &self,
        message: &dyn Message,
        command: &str,
        ctx: &PreconditionContext,
    ) -> DispatchResult<()> {
        for (_, name) in &self.globals {
            let Some(precondition) = self.entries.get(name) else {
                continue;
            };
            trace!(precondition = %name, command, "Running global precondition");
            precondition.run(message, command, ctx).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PreconditionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("PreconditionStore")
            .field("names", &names)
            .field("globals", &self.globals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precondition::precondition_fn;
    use futures::FutureExt;
    use sigil_core::{PlainMessage, UserError};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recording(name: &'static str, log: &Log, pass: bool, position: Option<usize>) -> impl Precondition {
        let log = Arc::clone(log);
        let check = precondition_fn(name, move |_, _, _| {
            log.lock().unwrap().push(name);
            async move {
                if pass {
                    Ok(())
                } else {
                    Err(UserError::precondition(name, "denied").into())
                }
            }
            .boxed()
        });
        match position {
            Some(position) => check.global(position),
            None => check,
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let log = Log::default();
        let mut store = PreconditionStore::new();
        store.register(recording("A", &log, true, None)).unwrap();
        let err = store.register(recording("A", &log, true, None)).unwrap_err();
        assert_eq!(
            err,
            SetupError::Duplicate {
                kind: "precondition",
                name: "A".into()
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_globals_run_by_position() {
        let log = Log::default();
        let mut store = PreconditionStore::new();
        store.register(recording("Late", &log, true, Some(20))).unwrap();
        store.register(recording("Early", &log, true, Some(10))).unwrap();
        store.register(recording("Tied", &log, true, Some(10))).unwrap();
        store.register(recording("Local", &log, true, None)).unwrap();

        assert_eq!(
            store.globals().collect::<Vec<_>>(),
            vec!["Early", "Tied", "Late"]
        );

        let message = PlainMessage::new("!ping");
        store
            .run_globals(&message, "ping", &PreconditionContext::new())
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["Early", "Tied", "Late"]);
    }

    #[tokio::test]
    async fn test_globals_stop_at_first_denial() {
        let log = Log::default();
        let mut store = PreconditionStore::new();
        store.register(recording("Blocked", &log, false, Some(0))).unwrap();
        store.register(recording("Never", &log, true, Some(1))).unwrap();

        let message = PlainMessage::new("!ping");
        let err = store
            .run_globals(&message, "ping", &PreconditionContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.identifier(), Some("Blocked"));
        assert_eq!(*log.lock().unwrap(), vec!["Blocked"]);
    }
}
