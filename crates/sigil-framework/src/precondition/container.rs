use std::borrow::Cow;

use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize};
use tracing::trace;

use sigil_core::{DispatchResult, Message, PreconditionContext, SetupError};

use super::condition::{RunCondition, RunMode};
use super::store::PreconditionStore;

// =============================================================================
// Literal form
// =============================================================================

/// The declarative form of a precondition tree, as written in configuration.
///
/// ```toml
/// preconditions = ["GuildOnly", ["Owner", { name = "Permissions", context = { manage = true } }]]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreconditionEntry {
    /// A check by name.
    Name(String),
    /// A nested array whose condition is the parent's flipped.
    List(Vec<PreconditionEntry>),
    /// A check with its own context.
    Single {
        name: String,
        #[serde(default)]
        context: PreconditionContext,
    },
    /// A nested array with explicit mode and, optionally, condition.
    Array {
        entries: Vec<PreconditionEntry>,
        #[serde(default)]
        mode: RunMode,
        #[serde(default)]
        condition: Option<RunCondition>,
    },
}

impl From<&str> for PreconditionEntry {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<Vec<PreconditionEntry>> for PreconditionEntry {
    fn from(entries: Vec<PreconditionEntry>) -> Self {
        Self::List(entries)
    }
}

// =============================================================================
// Tree
// =============================================================================

/// A node of a command's precondition tree.
///
/// Trees are built once, at registration, and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum PreconditionContainer {
    /// One named check. `context` is layered over the dispatch context.
    Single {
        name: String,
        context: PreconditionContext,
    },
    /// Child nodes combined by `condition`, scheduled by `mode`.
    Array {
        mode: RunMode,
        condition: RunCondition,
        entries: Vec<PreconditionContainer>,
    },
}

impl Default for PreconditionContainer {
    fn default() -> Self {
        Self::Array {
            mode: RunMode::Sequential,
            condition: RunCondition::And,
            entries: Vec::new(),
        }
    }
}

impl PreconditionContainer {
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single {
            name: name.into(),
            context: PreconditionContext::default(),
        }
    }

    pub fn single_with(name: impl Into<String>, context: PreconditionContext) -> Self {
        Self::Single {
            name: name.into(),
            context,
        }
    }

    /// An `and` array. Empty arrays always pass.
    pub fn and(mode: RunMode, entries: Vec<PreconditionContainer>) -> Self {
        Self::Array {
            mode,
            condition: RunCondition::And,
            entries,
        }
    }

    /// An `or` array. Fails with [`SetupError::EmptyOrContainer`] when
    /// `entries` is empty.
    pub fn or(mode: RunMode, entries: Vec<PreconditionContainer>) -> Result<Self, SetupError> {
        if entries.is_empty() {
            return Err(SetupError::EmptyOrContainer);
        }
        Ok(Self::Array {
            mode,
            condition: RunCondition::Or,
            entries,
        })
    }

    /// Builds a tree from a top-level list: an `and` array whose nested
    /// lists alternate between `or` and `and`.
    pub fn from_entries(entries: &[PreconditionEntry]) -> Result<Self, SetupError> {
        build_array(entries, RunMode::Sequential, RunCondition::And)
    }

    /// Builds a tree from any literal. A lone check is wrapped in an `and`
    /// array; an explicit array keeps its own mode and condition.
    pub fn from_entry(entry: &PreconditionEntry) -> Result<Self, SetupError> {
        match entry {
            PreconditionEntry::List(entries) => Self::from_entries(entries),
            PreconditionEntry::Array {
                entries,
                mode,
                condition,
            } => build_array(entries, *mode, condition.unwrap_or(RunCondition::And)),
            single => build_array(
                std::slice::from_ref(single),
                RunMode::Sequential,
                RunCondition::And,
            ),
        }
    }

    /// Checks that every named precondition is registered in `store` and
    /// that no `or` array is empty.
    pub fn validate(&self, store: &PreconditionStore) -> Result<(), SetupError> {
        match self {
            Self::Single { name, .. } => {
                if store.contains(name) {
                    Ok(())
                } else {
                    Err(SetupError::UnknownPrecondition(name.clone()))
                }
            }
            Self::Array {
                condition: RunCondition::Or,
                entries,
                ..
            } if entries.is_empty() => Err(SetupError::EmptyOrContainer),
            Self::Array { entries, .. } => entries.iter().try_for_each(|e| e.validate(store)),
        }
    }

    /// Names of every check in the tree, depth first.
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Single { name, .. } => out.push(name),
            Self::Array { entries, .. } => entries.iter().for_each(|e| e.collect_names(out)),
        }
    }

    /// Evaluates the tree.
    ///
    /// A check's own result is returned unchanged. Sequential arrays stop
    /// as soon as the outcome is decided; parallel arrays run every child
    /// to completion and then decide over the results in declaration order.
    pub fn run<'a>(
        &'a self,
        store: &'a PreconditionStore,
        message: &'a dyn Message,
        command: &'a str,
        ctx: &'a PreconditionContext,
    ) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(async move {
            match self {
                Self::Single { name, context } => {
                    let Some(precondition) = store.get(name) else {
                        return Err(SetupError::UnknownPrecondition(name.clone()).into());
                    };
                    let effective = if context.is_empty() {
                        Cow::Borrowed(ctx)
                    } else {
                        Cow::Owned(ctx.merged(context))
                    };
                    trace!(precondition = %name, command, "Running precondition");
                    precondition.run(message, command, &effective).await
                }
                Self::Array {
                    mode: RunMode::Sequential,
                    condition,
                    entries,
                } => {
                    let mut last = None;
                    for entry in entries {
                        let result = entry.run(store, message, command, ctx).await;
                        if condition.decides(&result) {
                            return result;
                        }
                        last = Some(result);
                    }
                    condition.undecided(last)
                }
                Self::Array {
                    mode: RunMode::Parallel,
                    condition,
                    entries,
                } => {
                    let results = join_all(
                        entries
                            .iter()
                            .map(|entry| entry.run(store, message, command, ctx)),
                    )
                    .await;
                    condition.combine(results)
                }
            }
        })
    }
}

fn build_array(
    entries: &[PreconditionEntry],
    mode: RunMode,
    condition: RunCondition,
) -> Result<PreconditionContainer, SetupError> {
    if entries.is_empty() && condition == RunCondition::Or {
        return Err(SetupError::EmptyOrContainer);
    }

    let nested = condition.flip();
    let entries = entries
        .iter()
        .map(|entry| build_entry(entry, nested))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PreconditionContainer::Array {
        mode,
        condition,
        entries,
    })
}

fn build_entry(
    entry: &PreconditionEntry,
    nested: RunCondition,
) -> Result<PreconditionContainer, SetupError> {
    match entry {
        PreconditionEntry::Name(name) => {
            check_name(name)?;
            Ok(PreconditionContainer::single(name.clone()))
        }
        PreconditionEntry::Single { name, context } => {
            check_name(name)?;
            Ok(PreconditionContainer::single_with(name.clone(), context.clone()))
        }
        PreconditionEntry::List(entries) => build_array(entries, RunMode::Sequential, nested),
        PreconditionEntry::Array {
            entries,
            mode,
            condition,
        } => build_array(entries, *mode, condition.unwrap_or(nested)),
    }
}

fn check_name(name: &str) -> Result<(), SetupError> {
    if name.trim().is_empty() {
        return Err(SetupError::MalformedPrecondition(
            "precondition names cannot be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precondition::Precondition;
    use async_trait::async_trait;
    use serde_json::json;
    use sigil_core::{DispatchError, PlainMessage, UserError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Check {
        name: &'static str,
        pass: bool,
        delay_ms: u64,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Precondition for Check {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(
            &self,
            _message: &dyn Message,
            _command: &str,
            _ctx: &PreconditionContext,
        ) -> DispatchResult<()> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.pass {
                Ok(())
            } else {
                Err(UserError::precondition(self.name, "denied").into())
            }
        }
    }

    /// Records the context the check was called with.
    struct Echo;

    #[async_trait]
    impl Precondition for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn run(
            &self,
            _message: &dyn Message,
            _command: &str,
            ctx: &PreconditionContext,
        ) -> DispatchResult<()> {
            if ctx.get_as::<bool>("external") == Some(true) && ctx.contains_key("scope") {
                Ok(())
            } else {
                Err(UserError::precondition("Echo", "context not merged").into())
            }
        }
    }

    struct Fixture {
        store: PreconditionStore,
        calls: Vec<(&'static str, Arc<AtomicUsize>)>,
    }

    impl Fixture {
        fn new(checks: &[(&'static str, bool, u64)]) -> Self {
            let mut store = PreconditionStore::new();
            let mut calls = Vec::new();
            for &(name, pass, delay_ms) in checks {
                let counter = Arc::new(AtomicUsize::new(0));
                store
                    .register(Check {
                        name,
                        pass,
                        delay_ms,
                        calls: Arc::clone(&counter),
                    })
                    .unwrap();
                calls.push((name, counter));
            }
            Self { store, calls }
        }

        fn calls(&self, name: &str) -> usize {
            self.calls
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| c.load(Ordering::SeqCst))
                .unwrap_or_default()
        }

        async fn run(&self, tree: &PreconditionContainer) -> DispatchResult<()> {
            let message = PlainMessage::new("!cmd");
            tree.run(&self.store, &message, "cmd", &PreconditionContext::new())
                .await
        }
    }

    fn names(names: &[&str]) -> Vec<PreconditionEntry> {
        names.iter().map(|n| PreconditionEntry::from(*n)).collect()
    }

    #[tokio::test]
    async fn test_and_short_circuits() {
        let fx = Fixture::new(&[("A", false, 0), ("B", true, 0)]);
        let tree = PreconditionContainer::from_entries(&names(&["A", "B"])).unwrap();

        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("A"));
        assert_eq!(fx.calls("A"), 1);
        assert_eq!(fx.calls("B"), 0);
    }

    #[tokio::test]
    async fn test_or_short_circuits_on_success() {
        let fx = Fixture::new(&[("A", true, 0), ("B", true, 0)]);
        let tree = PreconditionContainer::or(
            RunMode::Sequential,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::single("B"),
            ],
        )
        .unwrap();

        fx.run(&tree).await.unwrap();
        assert_eq!(fx.calls("A"), 1);
        assert_eq!(fx.calls("B"), 0);
    }

    #[tokio::test]
    async fn test_and_stops_at_first_denial() {
        let fx = Fixture::new(&[("A", true, 0), ("B", false, 0), ("C", true, 0)]);
        let tree = PreconditionContainer::and(
            RunMode::Sequential,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::single("B"),
                PreconditionContainer::single("C"),
            ],
        );

        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("B"));
        assert_eq!(fx.calls("A"), 1);
        assert_eq!(fx.calls("B"), 1);
        assert_eq!(fx.calls("C"), 0);
    }

    #[tokio::test]
    async fn test_or_moves_past_denial_then_stops() {
        let fx = Fixture::new(&[("A", false, 0), ("B", true, 0), ("C", false, 0)]);
        let tree = PreconditionContainer::or(
            RunMode::Sequential,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::single("B"),
                PreconditionContainer::single("C"),
            ],
        )
        .unwrap();

        fx.run(&tree).await.unwrap();
        assert_eq!(fx.calls("A"), 1);
        assert_eq!(fx.calls("B"), 1);
        assert_eq!(fx.calls("C"), 0);
    }

    #[tokio::test]
    async fn test_exhausted_or_returns_last_error() {
        let fx = Fixture::new(&[("A", false, 0), ("B", false, 0)]);
        let tree = PreconditionContainer::from_entries(&[names(&["A", "B"]).into()]).unwrap();

        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("B"));
    }

    #[test]
    fn test_nested_alternation_structure() {
        // [A, [B, [C, D]]] reads as A && (B || (C && D))
        let literal: PreconditionEntry =
            serde_json::from_value(json!(["A", ["B", ["C", "D"]]])).unwrap();
        let tree = PreconditionContainer::from_entry(&literal).unwrap();

        let PreconditionContainer::Array {
            condition: top,
            entries,
            ..
        } = &tree
        else {
            panic!("expected an array");
        };
        assert_eq!(*top, RunCondition::And);

        let PreconditionContainer::Array {
            condition: middle,
            entries,
            ..
        } = &entries[1]
        else {
            panic!("expected a nested array");
        };
        assert_eq!(*middle, RunCondition::Or);

        let PreconditionContainer::Array {
            condition: inner, ..
        } = &entries[1]
        else {
            panic!("expected a doubly nested array");
        };
        assert_eq!(*inner, RunCondition::And);
        assert_eq!(tree.names(), vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_nested_alternation_evaluation() {
        let literal = json!(["A", ["B", ["C", "D"]]]);
        let tree = PreconditionContainer::from_entry(&serde_json::from_value(literal).unwrap())
            .unwrap();

        // A && (false || (true && true))
        let fx = Fixture::new(&[("A", true, 0), ("B", false, 0), ("C", true, 0), ("D", true, 0)]);
        fx.run(&tree).await.unwrap();

        // A && (false || (true && false)): the or is exhausted, D's error surfaces
        let fx = Fixture::new(&[("A", true, 0), ("B", false, 0), ("C", true, 0), ("D", false, 0)]);
        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("D"));

        // B passing settles the or without touching C or D
        let fx = Fixture::new(&[("A", true, 0), ("B", true, 0), ("C", true, 0), ("D", true, 0)]);
        fx.run(&tree).await.unwrap();
        assert_eq!(fx.calls("C"), 0);
        assert_eq!(fx.calls("D"), 0);
    }

    #[tokio::test]
    async fn test_empty_and_passes() {
        let fx = Fixture::new(&[]);
        let tree = PreconditionContainer::from_entries(&[]).unwrap();
        fx.run(&tree).await.unwrap();
        fx.run(&PreconditionContainer::default()).await.unwrap();
    }

    #[test]
    fn test_empty_or_rejected_at_construction() {
        let nested_empty = vec![PreconditionEntry::List(Vec::new())];
        assert_eq!(
            PreconditionContainer::from_entries(&nested_empty),
            Err(SetupError::EmptyOrContainer)
        );

        let explicit = PreconditionEntry::Array {
            entries: Vec::new(),
            mode: RunMode::Parallel,
            condition: Some(RunCondition::Or),
        };
        assert_eq!(
            PreconditionContainer::from_entry(&explicit),
            Err(SetupError::EmptyOrContainer)
        );

        assert_eq!(
            PreconditionContainer::or(RunMode::Sequential, Vec::new()),
            Err(SetupError::EmptyOrContainer)
        );
    }

    #[test]
    fn test_validate_rejects_hand_built_empty_or() {
        let fx = Fixture::new(&[("A", true, 0)]);
        let tree = PreconditionContainer::and(
            RunMode::Sequential,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::Array {
                    mode: RunMode::Parallel,
                    condition: RunCondition::Or,
                    entries: Vec::new(),
                },
            ],
        );
        assert_eq!(tree.validate(&fx.store), Err(SetupError::EmptyOrContainer));
    }

    #[test]
    fn test_empty_name_is_malformed() {
        let err = PreconditionContainer::from_entries(&names(&["A", " "])).unwrap_err();
        assert!(matches!(err, SetupError::MalformedPrecondition(_)));
    }

    #[tokio::test]
    async fn test_parallel_runs_every_child() {
        // A denies immediately, B passes later; B still runs to completion
        let fx = Fixture::new(&[("A", false, 0), ("B", true, 20)]);
        let literal = PreconditionEntry::Array {
            entries: names(&["A", "B"]),
            mode: RunMode::Parallel,
            condition: None,
        };
        let tree = PreconditionContainer::from_entry(&literal).unwrap();

        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("A"));
        assert_eq!(fx.calls("A"), 1);
        assert_eq!(fx.calls("B"), 1);
    }

    #[tokio::test]
    async fn test_parallel_decides_in_declaration_order() {
        // B finishes first, but A is declared first
        let fx = Fixture::new(&[("A", false, 20), ("B", false, 0)]);
        let tree = PreconditionContainer::and(
            RunMode::Parallel,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::single("B"),
            ],
        );
        let err = fx.run(&tree).await.unwrap_err();
        assert_eq!(err.identifier(), Some("A"));

        let fx = Fixture::new(&[("A", false, 20), ("B", false, 0), ("C", true, 10)]);
        let tree = PreconditionContainer::or(
            RunMode::Parallel,
            vec![
                PreconditionContainer::single("A"),
                PreconditionContainer::single("B"),
                PreconditionContainer::single("C"),
            ],
        )
        .unwrap();
        fx.run(&tree).await.unwrap();
        assert_eq!(fx.calls("A"), 1);
    }

    #[tokio::test]
    async fn test_unknown_precondition() {
        let fx = Fixture::new(&[("A", true, 0)]);
        let tree = PreconditionContainer::from_entries(&names(&["A", "Ghost"])).unwrap();

        assert_eq!(
            tree.validate(&fx.store),
            Err(SetupError::UnknownPrecondition("Ghost".into()))
        );
        let err = fx.run(&tree).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Setup(SetupError::UnknownPrecondition(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_precondition_not_outvoted_by_or() {
        let fx = Fixture::new(&[("A", true, 0)]);
        let tree = PreconditionContainer::from_entries(&[names(&["Ghost", "A"]).into()]).unwrap();
        let err = fx.run(&tree).await.unwrap_err();
        assert!(err.is_setup());
        assert_eq!(fx.calls("A"), 0);
    }

    #[tokio::test]
    async fn test_single_context_is_merged() {
        let mut store = PreconditionStore::new();
        store.register(Echo).unwrap();

        let literal: PreconditionEntry =
            serde_json::from_value(json!([{ "name": "Echo", "context": { "external": true } }]))
                .unwrap();
        let tree = PreconditionContainer::from_entry(&literal).unwrap();

        let message = PlainMessage::new("!cmd");
        let dispatch_ctx = PreconditionContext::new()
            .with("external", false)
            .with("scope", "guild");
        tree.run(&store, &message, "cmd", &dispatch_ctx)
            .await
            .unwrap();

        // without the entry context the dispatch value stands
        let bare = PreconditionContainer::from_entries(&names(&["Echo"])).unwrap();
        assert!(
            bare.run(&store, &message, "cmd", &dispatch_ctx)
                .await
                .is_err()
        );
    }

    #[test]
    fn test_literal_shapes() {
        let literal: PreconditionEntry = serde_json::from_value(json!([
            "A",
            { "name": "B", "context": { "limit": 2 } },
            { "entries": ["C", "D"], "mode": "parallel" },
            { "entries": ["E"], "condition": "and" }
        ]))
        .unwrap();
        let tree = PreconditionContainer::from_entry(&literal).unwrap();

        let PreconditionContainer::Array { entries, .. } = &tree else {
            panic!("expected an array");
        };
        assert_eq!(
            entries[1],
            PreconditionContainer::single_with("B", PreconditionContext::new().with("limit", 2))
        );
        assert!(matches!(
            entries[2],
            PreconditionContainer::Array {
                mode: RunMode::Parallel,
                condition: RunCondition::Or,
                ..
            }
        ));
        assert!(matches!(
            entries[3],
            PreconditionContainer::Array {
                condition: RunCondition::And,
                ..
            }
        ));
    }

    #[test]
    fn test_lone_name_is_wrapped() {
        let tree = PreconditionContainer::from_entry(&PreconditionEntry::from("A")).unwrap();
        assert_eq!(
            tree,
            PreconditionContainer::and(RunMode::Sequential, vec![PreconditionContainer::single("A")])
        );
    }
}
