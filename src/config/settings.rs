//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use super::command::Command;
use crate::{Error, Result};

/// Window during which events following a run are discarded.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Ignore file read from the watch root.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Version-control metadata directory, always ignored.
pub const DEFAULT_VCS_DIR: &str = ".git";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration for a watch session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree to watch; also the working directory of each run.
    pub root: PathBuf,

    /// Command to run on change.
    pub command: Command,

    /// Name of the ignore file inside `root`.
    pub ignore_file: String,

    /// Version-control metadata directory added to every ignore set.
    pub vcs_dir: String,

    /// Debounce window after each run. Not exposed on the command line.
    pub quiet_window: Duration,

    /// Run the command once before watching starts.
    pub run_on_start: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            command: Command::default(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            vcs_dir: DEFAULT_VCS_DIR.to_string(),
            quiet_window: DEFAULT_QUIET_WINDOW,
            run_on_start: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.ignore_file.is_empty() {
            return Err(Error::config("ignore_file cannot be empty"));
        }

        if self.vcs_dir.is_empty() {
            return Err(Error::config("vcs_dir cannot be empty"));
        }

        if self.quiet_window.is_zero() {
            return Err(Error::config("quiet_window cannot be zero"));
        }

        Ok(())
    }

    /// Path of the ignore file under the watch root.
    #[must_use]
    pub fn ignore_path(&self) -> PathBuf {
        self.root.join(&self.ignore_file)
    }
}
