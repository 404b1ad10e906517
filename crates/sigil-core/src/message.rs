//! The message abstraction consumed by the pipeline.
//!
//! The host framework owns the real object model (channels, guilds,
//! permissions). Sigil only needs the raw text and a way for checks and
//! resolvers to get back to the concrete type, so [`Message`] is deliberately
//! small.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// An incoming chat message.
pub trait Message: Any + Send + Sync + Debug {
    /// The raw text content.
    fn content(&self) -> &str;

    /// The author's identifier, if the platform exposes one.
    fn author_id(&self) -> Option<&str> {
        None
    }

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Message {
    /// Downcasts to the concrete message type.
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A shared, type-erased message.
pub type BoxedMessage = Arc<dyn Message>;

/// A bare text message, useful for tests and for hosts with no richer model.
#[derive(Debug, Clone, Default)]
pub struct PlainMessage {
    content: String,
    author_id: Option<String>,
}

impl PlainMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author_id: None,
        }
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Wraps `self` into a [`BoxedMessage`].
    pub fn boxed(self) -> BoxedMessage {
        Arc::new(self)
    }
}

impl Message for PlainMessage {
    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
