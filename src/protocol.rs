//! # Wire Protocol
//!
//! This module implements the line-oriented text protocol spoken between a
//! linekv client and its server. Both the blocking and the async client frame
//! commands and decode replies through the types defined here.
//!
//! ## Protocol Format
//!
//! One command per line, tokens separated by a single space, terminated by `\n`:
//!
//! - `GET <key>` - Read a value
//! - `SET <key> <value> [ttl]` - Write a value, optionally expiring after `ttl`
//! - `ADD <key> <value> [ttl]` - Write a value only if the key is absent
//! - `INCR <key> [delta]` - Increment a counter (server default delta when omitted)
//! - `DECR <key> [delta]` - Decrement a counter
//! - `DEL <key>` - Delete a key
//!
//! There is no quoting or escaping, so keys and values must not contain
//! whitespace.
//!
//! ## Response Format
//!
//! Exactly one line per command. The body is either a payload (the stored or
//! new value, `true`/`false` for `DEL`) or one of the sentinels
//! `emptycommand`, `wrongcommand`, `protoerr`, which mean the server rejected
//! the command.
//!
//! ## Example Session
//! ```text
//! > SET a 1
//! < 1
//! > INCR a 2
//! < 3
//! > DEL a
//! < true
//! > FOO a
//! < wrongcommand
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Command verbs understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Set,
    Add,
    Incr,
    Decr,
    Del,
}

impl Verb {
    /// The uppercase token written on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Set => "SET",
            Verb::Add => "ADD",
            Verb::Incr => "INCR",
            Verb::Decr => "DECR",
            Verb::Del => "DEL",
        }
    }

    /// Case-insensitive lookup of a verb token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "SET" => Some(Verb::Set),
            "ADD" => Some(Verb::Add),
            "INCR" => Some(Verb::Incr),
            "DECR" => Some(Verb::Decr),
            "DEL" => Some(Verb::Del),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound request.
///
/// Optional numeric suffixes are `Option`s: `None` means the suffix is not
/// written and the server applies its own default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the value stored under `key`
    Get { key: String },

    /// Store `value` under `key`
    Set {
        key: String,
        value: String,
        /// Time-to-live in seconds
        ttl: Option<i64>,
    },

    /// Store `value` under `key` only if the key is absent
    Add {
        key: String,
        value: String,
        /// Time-to-live in seconds
        ttl: Option<i64>,
    },

    /// Increase the counter stored under `key`
    Incr { key: String, delta: Option<i64> },

    /// Decrease the counter stored under `key`
    Decr { key: String, delta: Option<i64> },

    /// Remove `key`
    Delete { key: String },
}

impl Command {
    pub fn verb(&self) -> Verb {
        match self {
            Command::Get { .. } => Verb::Get,
            Command::Set { .. } => Verb::Set,
            Command::Add { .. } => Verb::Add,
            Command::Incr { .. } => Verb::Incr,
            Command::Decr { .. } => Verb::Decr,
            Command::Delete { .. } => Verb::Del,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::Add { key, .. }
            | Command::Incr { key, .. }
            | Command::Decr { key, .. }
            | Command::Delete { key } => key,
        }
    }

    /// The value argument, for verbs that carry one.
    pub fn value(&self) -> Option<&str> {
        match self {
            Command::Set { value, .. } | Command::Add { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Encode the command as a wire line, without the trailing newline.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Check that every token can be framed without corrupting the stream.
    ///
    /// A key or value containing whitespace would split into extra tokens, and
    /// an embedded newline would turn one request into two, leaving a stray
    /// response on the connection. An empty value is written as-is (`SET k `)
    /// and left to the server; an empty key is rejected.
    pub fn validate(&self) -> Result<()> {
        let key = self.key();
        if key.is_empty() {
            return Err(Error::invalid_parameter("Key cannot be empty"));
        }
        check_token("Key", key)?;
        if let Some(value) = self.value() {
            check_token("Value", value)?;
        }
        Ok(())
    }

    /// Parse a wire line back into a command.
    ///
    /// The error says which sentinel a conforming server answers with, which
    /// lets test fixtures reply exactly like a real server.
    pub fn parse(input: &str) -> std::result::Result<Command, ParseError> {
        let parts: Vec<&str> = input.split_whitespace().collect();

        let (verb, args) = match parts.split_first() {
            Some((verb, args)) => (*verb, args),
            None => return Err(ParseError::Empty),
        };

        let verb = Verb::from_token(verb).ok_or_else(|| ParseError::UnknownVerb(verb.to_string()))?;

        match (verb, args) {
            (Verb::Get, [key]) => Ok(Command::Get { key: key.to_string() }),
            (Verb::Del, [key]) => Ok(Command::Delete { key: key.to_string() }),
            (Verb::Set, [key, value, rest @ ..]) | (Verb::Add, [key, value, rest @ ..]) if rest.len() <= 1 => {
                let ttl = parse_suffix::<i64>(verb, rest.first())?;
                let (key, value) = (key.to_string(), value.to_string());
                Ok(match verb {
                    Verb::Set => Command::Set { key, value, ttl },
                    _ => Command::Add { key, value, ttl },
                })
            }
            (Verb::Incr, [key, rest @ ..]) | (Verb::Decr, [key, rest @ ..]) if rest.len() <= 1 => {
                let delta = parse_suffix::<i64>(verb, rest.first())?;
                let key = key.to_string();
                Ok(match verb {
                    Verb::Incr => Command::Incr { key, delta },
                    _ => Command::Decr { key, delta },
                })
            }
            (verb, args) => Err(ParseError::Arity {
                verb,
                got: args.len(),
            }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.key())?;
        if let Some(value) = self.value() {
            write!(f, " {}", value)?;
        }
        match self {
            Command::Set { ttl: Some(ttl), .. } | Command::Add { ttl: Some(ttl), .. } => write!(f, " {}", ttl),
            Command::Incr { delta: Some(delta), .. } | Command::Decr { delta: Some(delta), .. } => {
                write!(f, " {}", delta)
            }
            _ => Ok(()),
        }
    }
}

fn check_token(what: &str, token: &str) -> Result<()> {
    if token.chars().any(char::is_whitespace) {
        return Err(Error::invalid_parameter(format!(
            "{} cannot contain whitespace or newlines",
            what
        )));
    }
    Ok(())
}

fn parse_suffix<T: std::str::FromStr>(verb: Verb, token: Option<&&str>) -> std::result::Result<Option<T>, ParseError> {
    token
        .map(|t| {
            t.parse::<T>().map_err(|_| ParseError::BadNumber {
                verb,
                token: t.to_string(),
            })
        })
        .transpose()
}

/// Why a line could not be parsed as a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("{verb} does not take {got} argument(s)")]
    Arity { verb: Verb, got: usize },

    #[error("{verb} suffix '{token}' is not a number")]
    BadNumber { verb: Verb, token: String },
}

impl ParseError {
    /// The sentinel a server answers for this kind of malformed line.
    pub fn sentinel(&self) -> Sentinel {
        match self {
            ParseError::Empty => Sentinel::EmptyCommand,
            ParseError::UnknownVerb(_) => Sentinel::WrongCommand,
            ParseError::Arity { .. } | ParseError::BadNumber { .. } => Sentinel::ProtoErr,
        }
    }
}

/// Reserved reply bodies signalling a server-side rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The server received an empty line
    EmptyCommand,
    /// The verb was not recognised
    WrongCommand,
    /// Arguments were missing, surplus or malformed
    ProtoErr,
}

impl Sentinel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::EmptyCommand => "emptycommand",
            Sentinel::WrongCommand => "wrongcommand",
            Sentinel::ProtoErr => "protoerr",
        }
    }

    /// Exact, case-sensitive match of a trimmed reply body.
    pub fn from_body(body: &str) -> Option<Self> {
        match body {
            "emptycommand" => Some(Sentinel::EmptyCommand),
            "wrongcommand" => Some(Sentinel::WrongCommand),
            "protoerr" => Some(Sentinel::ProtoErr),
            _ => None,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded response line.
///
/// Sentinels travel in-band: a stored value that is literally `protoerr`
/// decodes as `Reply::Sentinel` and cannot be told apart from a rejection.
/// This is kept for compatibility with existing servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Sentinel(Sentinel),
    Payload(String),
}

impl Reply {
    /// Decode a raw response line, trimming surrounding whitespace.
    pub fn from_line(line: &str) -> Self {
        let body = line.trim();
        match Sentinel::from_body(body) {
            Some(sentinel) => Reply::Sentinel(sentinel),
            None => Reply::Payload(body.to_string()),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Reply::Sentinel(_))
    }

    /// Outcome for value-producing verbs (GET, INCR, DECR): the payload, or
    /// an empty string when the server rejected the command.
    pub fn into_value(self) -> String {
        match self {
            Reply::Payload(body) => body,
            Reply::Sentinel(_) => String::new(),
        }
    }

    /// Outcome for SET and ADD: the server echoed exactly `value`.
    pub fn confirms(&self, value: &str) -> bool {
        matches!(self, Reply::Payload(body) if body == value)
    }

    /// Outcome for DEL: the server answered the literal `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Reply::Payload(body) if body == "true")
    }
}
