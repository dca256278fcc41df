//! Change events and the streams that carry them.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::error::WatcherError;

/// Something changed under a watched directory.
///
/// The kind of change is deliberately not recorded: every event means
/// "run the command again".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Paths reported by the backend for this change.
    pub paths: Vec<PathBuf>,
}

impl ChangeEvent {
    /// Create an event for a single path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    /// Get the primary path associated with this event.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }
}

/// Inbound change events.
pub type EventStream = mpsc::UnboundedReceiver<ChangeEvent>;

/// Inbound watch-subsystem failures.
pub type ErrorStream = mpsc::UnboundedReceiver<WatcherError>;

/// Both inbound streams of a notification subsystem.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: EventStream,
    pub errors: ErrorStream,
}

/// Producer side of [`WatchStreams`].
#[derive(Debug, Clone)]
pub struct WatchSenders {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<WatcherError>,
}

/// Create a connected pair of senders and streams.
#[must_use]
pub fn watch_channel() -> (WatchSenders, WatchStreams) {
    let (event_tx, events) = mpsc::unbounded_channel();
    let (error_tx, errors) = mpsc::unbounded_channel();
    (
        WatchSenders {
            events: event_tx,
            errors: error_tx,
        },
        WatchStreams { events, errors },
    )
}
