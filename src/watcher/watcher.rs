//! File system watcher using notify-rs.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::events::{watch_channel, ChangeEvent, WatchSenders, WatchStreams};
use super::registrar::WatchRegistry;
use crate::error::WatcherError;
use crate::Result;

/// Notification backend for the registered directories.
///
/// Directories are watched one by one, non-recursively; the registrar
/// decides which ones. Dropping the watcher stops notifications and closes
/// both streams.
pub struct FsWatcher {
    inner: RecommendedWatcher,
    watched_dirs: Vec<PathBuf>,
}

impl FsWatcher {
    /// Create a watcher and the streams it feeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform backend cannot be initialized.
    pub fn new() -> Result<(Self, WatchStreams)> {
        let (senders, streams) = watch_channel();

        let inner = notify::recommended_watcher(move |result: notify::Result<Event>| {
            forward(&senders, result);
        })
        .map_err(|e| WatcherError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        Ok((
            Self {
                inner,
                watched_dirs: Vec::new(),
            },
            streams,
        ))
    }

    /// Get list of watched directories.
    #[must_use]
    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.watched_dirs
    }
}

impl WatchRegistry for FsWatcher {
    fn register(&mut self, path: &Path) -> Result<()> {
        self.inner
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::watch_failed(path, e))?;

        self.watched_dirs.push(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Watching directory");
        Ok(())
    }
}

/// Route one backend notification onto the matching stream.
///
/// Send failures mean the dispatch loop is gone; there is nobody left to tell.
fn forward(senders: &WatchSenders, result: notify::Result<Event>) {
    match result {
        Ok(event) => {
            if is_change(&event.kind) {
                let _ = senders.events.send(ChangeEvent { paths: event.paths });
            }
        }
        Err(e) => {
            let _ = senders.errors.send(WatcherError::Notify(e.to_string()));
        }
    }
}

/// Access notifications (open, read, close-without-write) are not changes.
/// Without this filter a command that reads the tree would retrigger itself.
const fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}
