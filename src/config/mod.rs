//! Configuration management for watchrun.
//!
//! Values come from command-line arguments and environment variables
//! (parsed with clap in `main.rs`), falling back to the defaults here.

mod command;
mod settings;

pub use command::{Command, DEFAULT_COMMAND};
pub use settings::{Config, DEFAULT_IGNORE_FILE, DEFAULT_QUIET_WINDOW, DEFAULT_VCS_DIR};
