//! Shell-like splitting of command parameters.
//!
//! The [`Lexer`] turns the text following a command name into [`Parameters`]:
//! ordered positional tokens plus the flags (`--verbose`) and options
//! (`--limit=5`) it recognised along the way.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Which flag or option names the lexer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accept {
    /// `true` accepts every name, `false` none.
    All(bool),
    /// Only the listed names.
    Only(Vec<String>),
}

impl Accept {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::All(all) => *all,
            Self::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

impl Default for Accept {
    fn default() -> Self {
        Self::All(false)
    }
}

/// Lexer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerOptions {
    /// Opening/closing quote pairs.
    pub quotes: Vec<(String, String)>,
    /// Prefixes introducing a flag or option.
    pub flag_prefixes: Vec<String>,
    /// Separators between an option's key and value.
    pub separators: Vec<String>,
    pub flags: Accept,
    pub options: Accept,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            quotes: vec![
                ("\"".into(), "\"".into()),
                ("\u{201C}".into(), "\u{201D}".into()),
                ("\u{300C}".into(), "\u{300D}".into()),
            ],
            flag_prefixes: vec!["--".into(), "-".into(), "\u{2014}".into()],
            separators: vec!["=".into(), ":".into()],
            flags: Accept::default(),
            options: Accept::default(),
        }
    }
}

impl LexerOptions {
    pub fn flags(mut self, flags: Accept) -> Self {
        self.flags = flags;
        self
    }

    pub fn options(mut self, options: Accept) -> Self {
        self.options = options;
        self
    }

    /// Accepts only the given flag names.
    pub fn with_flags<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags(Accept::Only(names.into_iter().map(Into::into).collect()))
    }

    /// Accepts only the given option names.
    pub fn with_options<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options(Accept::Only(names.into_iter().map(Into::into).collect()))
    }
}

/// A positional token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text, without surrounding quotes.
    pub value: String,
    /// Whitespace that followed the token in the input.
    pub trailing: String,
    /// Whether the token was quoted.
    pub quoted: bool,
}

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            trailing: " ".into(),
            quoted: false,
        }
    }
}

/// The lexed parameters of one invocation. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    ordered: Vec<Token>,
    flags: HashSet<String>,
    options: HashMap<String, Vec<String>>,
}

impl Parameters {
    /// Builds parameters out of already split positional tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<Token> = tokens.into_iter().map(Token::new).collect();
        if let Some(last) = ordered.last_mut() {
            last.trailing.clear();
        }
        Self {
            ordered,
            ..Self::default()
        }
    }

    pub fn ordered(&self) -> &[Token] {
        &self.ordered
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.ordered.get(index)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// All values given for option `name`, in input order.
    pub fn option_values(&self, name: &str) -> Option<&[String]> {
        self.options.get(name).map(Vec::as_slice)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.options
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// Splits parameter text into [`Parameters`].
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    options: LexerOptions,
}

impl Lexer {
    pub fn new(mut options: LexerOptions) -> Self {
        // longest prefix first, so "--" is tried before "-"
        options
            .flag_prefixes
            .sort_by_key(|prefix| std::cmp::Reverse(prefix.len()));
        options.flag_prefixes.retain(|prefix| !prefix.is_empty());
        options.quotes.retain(|(open, close)| !open.is_empty() && !close.is_empty());
        Self { options }
    }

    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    /// Lexes `input`.
    ///
    /// - Whitespace separates tokens and is kept as the preceding token's
    ///   `trailing` text.
    /// - A token opening with a quote runs to the matching close quote (or
    ///   the end of input) and may contain whitespace.
    /// - An unquoted token starting with a flag prefix becomes an option
    ///   when it contains a separator and the key is accepted, or a flag
    ///   when the name is accepted. Otherwise it stays positional.
    pub fn lex(&self, input: &str) -> Parameters {
        let mut params = Parameters::default();
        let mut rest = input.trim_start();

        while !rest.is_empty() {
            let (value, quoted, after) = self.read_word(rest);
            let gap = after.len() - after.trim_start().len();
            let trailing = &after[..gap];
            rest = &after[gap..];

            if !quoted && self.classify(&value, &mut params) {
                continue;
            }
            params.ordered.push(Token {
                value,
                trailing: trailing.to_string(),
                quoted,
            });
        }

        params
    }

    fn read_word<'a>(&self, input: &'a str) -> (String, bool, &'a str) {
        for (open, close) in &self.options.quotes {
            if let Some(inner) = input.strip_prefix(open.as_str()) {
                return match inner.find(close.as_str()) {
                    Some(end) => (inner[..end].to_string(), true, &inner[end + close.len()..]),
                    None => (inner.to_string(), true, ""),
                };
            }
        }

        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        (input[..end].to_string(), false, &input[end..])
    }

    /// Records `word` as a flag or option. Returns `false` if it is positional.
    fn classify(&self, word: &str, params: &mut Parameters) -> bool {
        let Some(body) = self
            .options
            .flag_prefixes
            .iter()
            .find_map(|prefix| word.strip_prefix(prefix.as_str()))
            .filter(|body| !body.is_empty())
        else {
            return false;
        };

        if let Some((key, value)) = self.split_option(body)
            && self.options.options.accepts(key)
        {
            params
                .options
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
            return true;
        }

        if self.options.flags.accepts(body) {
            params.flags.insert(body.to_string());
            return true;
        }

        false
    }

    fn split_option<'a>(&self, body: &'a str) -> Option<(&'a str, &'a str)> {
        self.options
            .separators
            .iter()
            .filter(|sep| !sep.is_empty())
            .filter_map(|sep| body.find(sep.as_str()).map(|at| (at, sep.len())))
            .min_by_key(|(at, _)| *at)
            .filter(|(at, _)| *at > 0)
            .map(|(at, len)| (&body[..at], &body[at + len..]))
    }
}
