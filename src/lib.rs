//! watchrun library
//!
//! Watches a directory tree and re-runs a command whenever something in it
//! changes, collapsing bursts of related events into a single run.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod runner;
pub mod session;
pub mod watcher;

pub use config::{Command, Config};
pub use error::{CommandError, Error, Result, WatcherError};
