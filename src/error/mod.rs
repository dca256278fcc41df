//! Error types and Result aliases for watchrun.
//!
//! Setup and watch-subsystem failures are `Error`s and end the session.
//! A failing user command is a `CommandError` carried inside a
//! [`RunResult`](crate::runner::RunResult) and never stops the loop.

use thiserror::Error;

/// Result type alias using watchrun's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for watchrun operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File watcher errors.
///
/// Also the item type of the error stream: every value received there is a
/// fatal signal for the dispatch loop.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Failed while walking the tree to register directories.
    #[error("failed to walk '{path}': {reason}")]
    Walk { path: String, reason: String },

    /// The notification backend reported a failure.
    #[error("notification error: {0}")]
    Notify(String),

    /// A notification stream was closed by its producer.
    #[error("{0} stream closed")]
    StreamClosed(&'static str),
}

/// Failures of the watched command. Non-fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// Output could not be collected or the child could not be awaited.
    #[error("failed to capture output: {0}")]
    Capture(String),

    /// The program ran and exited unsuccessfully.
    #[error("{0}")]
    Failed(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl WatcherError {
    /// Create a watch failure for `path`.
    pub fn watch_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::WatchFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
