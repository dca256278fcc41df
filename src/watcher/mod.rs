//! File system watching and change dispatch.
//!
//! This module provides:
//! - Ignore-prefix loading from `.gitignore`
//! - One-shot registration of the directory tree with notify-rs
//! - Fixed-window draining of event bursts
//! - The dispatch loop that runs the command on change

mod debounce;
mod events;
mod handler;
mod ignore;
mod registrar;
#[allow(clippy::module_inception)]
mod watcher;

pub use debounce::{drain_for, Debounce, FixedWindow};
pub use events::{
    watch_channel, ChangeEvent, ErrorStream, EventStream, WatchSenders, WatchStreams,
};
pub use handler::{DispatchState, DispatchStats, DispatchStatsSnapshot, Dispatcher, Stopped};
pub use ignore::IgnoreSet;
pub use registrar::{register_tree, RegistrationSummary, WatchRegistry};
pub use watcher::FsWatcher;
