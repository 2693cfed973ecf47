//! Unified error types for the execution engine.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ExecError
// ---------------------------------------------------------------------------

/// Errors arising from command execution.
///
/// The dispatch layer converts all of these to textual output, so no command
/// failure unwinds the REPL loop.
#[derive(Debug)]
pub enum ExecError {
    /// The shell or program could not be spawned.
    SpawnFailure(String),
    /// A synchronous captured command exceeded its time bound.
    Timeout(Duration),
    /// The child ran to completion but returned a failure status.
    NonZeroExit(i32),
    /// An interactive session was killed by a user interrupt.
    UserCancelled,
    /// Terminal or pipe I/O failed mid-session.
    Io(std::io::Error),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnFailure(msg) => write!(f, "failed to spawn: {msg}"),
            Self::Timeout(limit) => {
                write!(f, "command timed out after {}s", limit.as_secs())
            }
            Self::NonZeroExit(code) => write!(f, "command exited with status {code}"),
            Self::UserCancelled => write!(f, "command cancelled by user"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for ExecError {}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ScriptError
// ---------------------------------------------------------------------------

/// Errors raised while parsing or evaluating a script snippet.
///
/// The evaluator boundary renders these as textual `Error: ...` output; a bad
/// snippet never terminates the outer session.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The snippet could not be parsed at all.
    Parse(String),
    /// The snippet parsed but failed at runtime.
    Eval(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Eval(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ScriptError {}
