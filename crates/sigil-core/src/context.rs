//! Per-dispatch key/value data handed to precondition checks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque bag of extra data passed through precondition evaluation.
///
/// Each dispatch owns its own context. A single precondition entry may carry
/// a context of its own, which is layered over the dispatch-level one right
/// before the check runs (see [`merged`](Self::merged)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreconditionContext(Map<String, Value>);

impl PreconditionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserializes a single entry into `T`, returning `None` when the key is
    /// absent or has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|v| T::deserialize(v).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a copy of `self` with every entry of `overlay` written on top.
    pub fn merged(&self, overlay: &PreconditionContext) -> PreconditionContext {
        let mut out = self.0.clone();
        for (key, value) in &overlay.0 {
            out.insert(key.clone(), value.clone());
        }
        PreconditionContext(out)
    }
}

impl From<Map<String, Value>> for PreconditionContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
