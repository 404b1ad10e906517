//! Prefix resolution.
//!
//! A [`PrefixResolver`] decides whether a message is addressed to the bot and,
//! if so, exactly which leading slice of the content is the prefix. Sources
//! are tried in strict priority order:
//!
//! 1. **Mention**: `<@ID>` or `<@!ID>` for the bot's own client ID. A message
//!    consisting of nothing but the mention yields [`PrefixOutcome::MentionOnly`].
//! 2. **Regex**: a configured pattern matching at the very start.
//! 3. **Source**: whatever the [`PrefixSource`] returns for this message
//!    (a single string, an ordered list, or nothing). List order breaks ties.
//!
//! With case-insensitive matching enabled both sides are folded before
//! comparison, but the matched prefix is always the original-case slice of
//! the content.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use sigil_core::{DispatchResult, Message, SetupError};

/// Shortest content, in characters, that can hold a mention (`<@` + a 17
/// digit ID + `>`).
const MENTION_MIN_LENGTH: usize = 20;

// ─── Prefix ───────────────────────────────────────────────────────────────────

/// A prefix as handed out by a [`PrefixSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prefix {
    /// No prefix; only mentions (and the regex prefix) can trigger commands.
    #[default]
    None,
    /// A single prefix, e.g. `"!"`.
    Single(String),
    /// Several prefixes; the first one the content starts with wins.
    Many(Vec<String>),
}

impl Prefix {
    /// Iterates the candidates in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::None => &[],
            Self::Single(prefix) => std::slice::from_ref(prefix),
            Self::Many(prefixes) => prefixes,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for Prefix {
    fn from(prefix: &str) -> Self {
        Self::Single(prefix.to_string())
    }
}

impl From<String> for Prefix {
    fn from(prefix: String) -> Self {
        Self::Single(prefix)
    }
}

impl From<Vec<String>> for Prefix {
    fn from(prefixes: Vec<String>) -> Self {
        Self::Many(prefixes)
    }
}

impl From<&[&str]> for Prefix {
    fn from(prefixes: &[&str]) -> Self {
        Self::Many(prefixes.iter().map(|p| p.to_string()).collect())
    }
}

// ─── PrefixSource ─────────────────────────────────────────────────────────────

/// Supplies the prefix(es) valid for a given message.
///
/// Implementations may perform I/O (e.g. a per-guild database lookup). Errors
/// are propagated to the caller of [`PrefixResolver::resolve`] unchanged.
#[async_trait]
pub trait PrefixSource: Send + Sync {
    async fn fetch(&self, message: &dyn Message) -> DispatchResult<Prefix>;
}

/// A fixed prefix serves as its own source.
#[async_trait]
impl PrefixSource for Prefix {
    async fn fetch(&self, _message: &dyn Message) -> DispatchResult<Prefix> {
        Ok(self.clone())
    }
}

/// A [`PrefixSource`] backed by an async closure. Created by [`prefix_fn`].
pub struct PrefixFn<F>(F);

#[async_trait]
impl<F> PrefixSource for PrefixFn<F>
where
    F: for<'a> Fn(&'a dyn Message) -> BoxFuture<'a, DispatchResult<Prefix>> + Send + Sync,
{
    async fn fetch(&self, message: &dyn Message) -> DispatchResult<Prefix> {
        (self.0)(message).await
    }
}

/// Wraps an async closure into a [`PrefixSource`].
///
/// # Example
///
/// ```rust,ignore
/// use futures::FutureExt;
///
/// let source = prefix_fn(|message| {
///     async move {
///         let prefix = db.guild_prefix(message).await.map_err(DispatchError::upstream)?;
///         Ok(Prefix::from(prefix))
///     }
///     .boxed()
/// });
/// ```
pub fn prefix_fn<F>(f: F) -> PrefixFn<F>
where
    F: for<'a> Fn(&'a dyn Message) -> BoxFuture<'a, DispatchResult<Prefix>> + Send + Sync,
{
    PrefixFn(f)
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// Which source produced a [`MatchedPrefix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixKind {
    Mention,
    Regex,
    Literal,
}

/// A prefix found at the start of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPrefix {
    kind: PrefixKind,
    /// The configured form: the candidate string, the regex pattern, or the
    /// mention itself.
    configured: String,
    /// The exact slice of the content that matched.
    matched: String,
}

impl MatchedPrefix {
    fn new(kind: PrefixKind, configured: impl Into<String>, matched: impl Into<String>) -> Self {
        Self {
            kind,
            configured: configured.into(),
            matched: matched.into(),
        }
    }

    pub fn kind(&self) -> PrefixKind {
        self.kind
    }

    pub fn configured(&self) -> &str {
        &self.configured
    }

    /// The original-case slice of the content.
    pub fn as_str(&self) -> &str {
        &self.matched
    }

    /// Byte length of the matched slice; argument text begins here.
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Result of resolving a message's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixOutcome {
    /// The message is exactly the bot's mention and nothing else.
    MentionOnly,
    /// The message starts with a recognised prefix.
    Prefixed(MatchedPrefix),
    /// No prefix matched.
    NonePrefixed,
}

// ─── PrefixResolver ───────────────────────────────────────────────────────────

/// Resolves the prefix of incoming messages.
///
/// Cheap to clone; the prefix source is shared.
#[derive(Clone)]
pub struct PrefixResolver {
    client_id: Option<String>,
    mention_prefix: bool,
    regex_prefix: Option<Regex>,
    case_insensitive: bool,
    source: Arc<dyn PrefixSource>,
}

impl PrefixResolver {
    /// Creates a resolver with mention detection enabled and case-sensitive
    /// matching.
    pub fn new(source: impl PrefixSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn PrefixSource>) -> Self {
        Self {
            client_id: None,
            mention_prefix: true,
            regex_prefix: None,
            case_insensitive: false,
            source,
        }
    }

    /// Sets the bot's own ID, enabling mention prefixes.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Enables or disables mention prefixes (default: `true`).
    pub fn mention_prefix(mut self, enabled: bool) -> Self {
        self.mention_prefix = enabled;
        self
    }

    pub fn regex_prefix(mut self, regex: Regex) -> Self {
        self.regex_prefix = Some(regex);
        self
    }

    /// Compiles `pattern` and uses it as the regex prefix.
    pub fn regex_pattern(self, pattern: &str) -> Result<Self, SetupError> {
        let regex = Regex::new(pattern).map_err(|e| SetupError::InvalidRegexPrefix {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.regex_prefix(regex))
    }

    /// Enables case-insensitive matching of source prefixes (default: `false`).
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Resolves the prefix of `message`.
    ///
    /// The prefix source is only consulted when neither the mention nor the
    /// regex prefix matched.
    pub async fn resolve(&self, message: &dyn Message) -> DispatchResult<PrefixOutcome> {
        let content = message.content();

        if let Some(mention) = self.mention_prefix_of(content) {
            if mention.len() == content.len() {
                trace!("Message is a bare mention");
                return Ok(PrefixOutcome::MentionOnly);
            }
            trace!(prefix = mention, "Matched mention prefix");
            return Ok(PrefixOutcome::Prefixed(MatchedPrefix::new(
                PrefixKind::Mention,
                mention,
                mention,
            )));
        }

        if let Some(matched) = self.regex_prefix_of(content) {
            trace!(prefix = matched, "Matched regex prefix");
            let pattern = self
                .regex_prefix
                .as_ref()
                .map(|r| r.as_str())
                .unwrap_or_default();
            return Ok(PrefixOutcome::Prefixed(MatchedPrefix::new(
                PrefixKind::Regex,
                pattern,
                matched,
            )));
        }

        let prefix = self.source.fetch(message).await?;
        match self.match_prefix(content, &prefix) {
            Some((candidate, matched)) => {
                trace!(prefix = matched, "Matched source prefix");
                Ok(PrefixOutcome::Prefixed(MatchedPrefix::new(
                    PrefixKind::Literal,
                    candidate,
                    matched,
                )))
            }
            None => Ok(PrefixOutcome::NonePrefixed),
        }
    }

    /// Returns the mention span at the start of `content`, if it mentions
    /// this client.
    pub fn mention_prefix_of<'c>(&self, content: &'c str) -> Option<&'c str> {
        if !self.mention_prefix {
            return None;
        }
        let id = self.client_id.as_deref()?;

        if content.chars().nth(MENTION_MIN_LENGTH - 1).is_none() || !content.starts_with("<@") {
            return None;
        }

        let offset = if content.as_bytes().get(2) == Some(&b'!') {
            3
        } else {
            2
        };
        let end = offset + id.len();
        if content.as_bytes().get(end) != Some(&b'>') {
            return None;
        }

        let mentioned = content.get(offset..end)?;
        (mentioned == id).then(|| &content[..=end])
    }

    /// Returns the regex prefix match, provided it starts at the first byte.
    pub fn regex_prefix_of<'c>(&self, content: &'c str) -> Option<&'c str> {
        let found = self.regex_prefix.as_ref()?.find(content)?;
        (found.start() == 0).then(|| found.as_str())
    }

    /// Finds the first candidate of `prefix` that `content` starts with.
    ///
    /// Returns the candidate together with the matched slice of `content`.
    pub fn match_prefix<'c, 'p>(
        &self,
        content: &'c str,
        prefix: &'p Prefix,
    ) -> Option<(&'p str, &'c str)> {
        prefix.candidates().find_map(|candidate| {
            strip_candidate(content, candidate, self.case_insensitive)
                .map(|matched| (candidate, matched))
        })
    }
}

impl std::fmt::Debug for PrefixResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixResolver")
            .field("client_id", &self.client_id)
            .field("mention_prefix", &self.mention_prefix)
            .field("regex_prefix", &self.regex_prefix)
            .field("case_insensitive", &self.case_insensitive)
            .finish_non_exhaustive()
    }
}

/// Returns the leading slice of `content` equal to `candidate`.
///
/// With `fold` set, characters are compared by their lowercase forms and the
/// returned slice keeps the content's own casing.
fn strip_candidate<'c>(content: &'c str, candidate: &str, fold: bool) -> Option<&'c str> {
    if !fold {
        return content
            .starts_with(candidate)
            .then(|| &content[..candidate.len()]);
    }

    let mut chars = content.char_indices();
    let mut end = 0;
    for expected in candidate.chars() {
        let (index, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = index + actual.len_utf8();
    }
    Some(&content[..end])
}
