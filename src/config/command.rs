//! The command executed on every change.

use std::fmt;

use crate::{Error, Result};

/// Command used when no arguments are given.
pub const DEFAULT_COMMAND: &[&str] = &["go", "test"];

/// Program name plus arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    parts: Vec<String>,
}

impl Command {
    /// Create a command from an explicit argument vector.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `parts` is empty.
    pub fn new(parts: Vec<String>) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::config("command cannot be empty"));
        }
        Ok(Self { parts })
    }

    /// Resolve the command from the arguments that follow the program name.
    ///
    /// No arguments selects [`DEFAULT_COMMAND`]; otherwise the arguments are
    /// used verbatim.
    #[must_use]
    pub fn resolve(args: Vec<String>) -> Self {
        if args.is_empty() {
            Self::default()
        } else {
            Self { parts: args }
        }
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.parts[0]
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.parts[1..]
    }

    /// The full argument vector.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl Default for Command {
    fn default() -> Self {
        Self {
            parts: DEFAULT_COMMAND.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join(" "))
    }
}
