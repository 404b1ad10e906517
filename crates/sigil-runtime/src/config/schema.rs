//! Configuration schema definitions.
//!
//! ```toml
//! [client]
//! id = "266624760782258186"
//! default_prefix = ["!", "?"]
//! regex_prefix = "^(hey +)?bot[,! ]"
//! case_insensitive_commands = true
//!
//! [client.lexer]
//! flags = true
//!
//! [logging]
//! level = "debug"
//! filters = { sigil_framework = "trace" }
//!
//! [commands.ban]
//! preconditions = ["GuildOnly", ["Owner", "Moderator"]]
//!
//! [commands.eval]
//! enabled = false
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sigil_framework::{LexerOptions, Prefix, PreconditionEntry};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigilConfig {
    /// Prefix and lexing behaviour.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-command overrides, keyed by command name or alias.
    #[serde(default)]
    pub commands: HashMap<String, CommandConfig>,
}

// =============================================================================
// Client
// =============================================================================

/// How messages are recognised as commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The bot's own user ID, needed for mention prefixes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Whether `<@ID>` works as a prefix.
    #[serde(default = "default_true")]
    pub mention_prefix: bool,

    /// A single prefix or a list of prefixes, tried in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_prefix: Option<Prefix>,

    /// A pattern that must match at the start of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_prefix: Option<String>,

    #[serde(default)]
    pub case_insensitive_prefixes: bool,

    #[serde(default)]
    pub case_insensitive_commands: bool,

    /// Lexer options for commands that don't define their own.
    #[serde(default)]
    pub lexer: LexerOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            id: None,
            mention_prefix: true,
            default_prefix: None,
            regex_prefix: None,
            case_insensitive_prefixes: false,
            case_insensitive_commands: false,
            lexer: LexerOptions::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Commands
// =============================================================================

/// Overrides for a single command. Unset fields keep what the command
/// declares itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Replaces the command's precondition literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Vec<PreconditionEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Needs the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Required when `output = "file"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,

    pub thread_ids: bool,
    /// Include file names and line numbers.
    pub file_location: bool,
    pub span_events: SpanEventConfig,

    /// Per-target levels, e.g. `sigil_framework = "trace"`.
    pub filters: HashMap<String, String>,
}
