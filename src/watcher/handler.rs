//! Dispatch loop: turns change events into command runs.
//!
//! ```text
//! Idle --change--> Running --done--> Debouncing --window over--> Idle
//!   \--error signal--> Terminated
//! ```
//!
//! Error signals are only looked at while idle. One that arrives during a
//! run or a drain stays queued until the loop is idle again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::debounce::Debounce;
use super::events::WatchStreams;
use crate::config::Command;
use crate::error::WatcherError;
use crate::runner::CommandRunner;
use crate::Result;

/// Statistics for a watch session.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub events_received: AtomicU64,
    pub events_coalesced: AtomicU64,
    pub runs_started: AtomicU64,
    pub runs_failed: AtomicU64,
}

impl DispatchStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_coalesced: self.events_coalesced.load(Ordering::Relaxed),
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub events_received: u64,
    pub events_coalesced: u64,
    pub runs_started: u64,
    pub runs_failed: u64,
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Running,
    Debouncing,
    Terminated,
}

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    /// The shutdown token was cancelled.
    Interrupted,
}

/// Runs the command once per idle change event, then drains the burst.
pub struct Dispatcher<R, D> {
    command: Command,
    runner: R,
    debouncer: D,
    quiet_window: Duration,
    state: DispatchState,
    stats: Arc<DispatchStats>,
}

impl<R: CommandRunner, D: Debounce> Dispatcher<R, D> {
    /// Create a dispatcher for `command`.
    pub fn new(command: Command, runner: R, debouncer: D, quiet_window: Duration) -> Self {
        Self {
            command,
            runner,
            debouncer,
            quiet_window,
            state: DispatchState::Idle,
            stats: DispatchStats::new(),
        }
    }

    /// Run until an error signal arrives or `shutdown` is cancelled.
    ///
    /// Cancellation also interrupts a run in progress (the child is killed)
    /// and a drain in progress.
    ///
    /// # Errors
    ///
    /// Returns the error signal received from the watch subsystem, or
    /// [`WatcherError::StreamClosed`] if either stream ends.
    pub async fn run(
        &mut self,
        mut streams: WatchStreams,
        shutdown: CancellationToken,
    ) -> Result<Stopped> {
        loop {
            self.transition(DispatchState::Idle);

            let event = tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(self.interrupted()),
                signal = streams.errors.recv() => {
                    let signal = signal.unwrap_or(WatcherError::StreamClosed("error"));
                    return Err(self.terminate(signal));
                }
                event = streams.events.recv() => match event {
                    Some(event) => event,
                    None => return Err(self.terminate(WatcherError::StreamClosed("event"))),
                },
            };

            self.stats.events_received.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = ?event.path(), "Change detected");

            self.transition(DispatchState::Running);
            self.stats.runs_started.fetch_add(1, Ordering::Relaxed);
            let result = tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(self.interrupted()),
                result = self.runner.run(&self.command) => result,
            };
            if !result.success {
                self.stats.runs_failed.fetch_add(1, Ordering::Relaxed);
            }

            self.transition(DispatchState::Debouncing);
            let discarded = tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(self.interrupted()),
                n = self.debouncer.debounce(&mut streams.events, self.quiet_window) => n,
            };
            self.stats
                .events_coalesced
                .fetch_add(discarded as u64, Ordering::Relaxed);
            self.stats
                .events_received
                .fetch_add(discarded as u64, Ordering::Relaxed);
            tracing::debug!(discarded, "Quiet window elapsed");
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DispatchState {
        self.state
    }

    /// Get current stats.
    #[must_use]
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// The injected runner.
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    fn transition(&mut self, next: DispatchState) {
        tracing::trace!(from = ?self.state, to = ?next, "Dispatch state");
        self.state = next;
    }

    fn terminate(&mut self, signal: WatcherError) -> crate::Error {
        self.transition(DispatchState::Terminated);
        tracing::error!(error = %signal, "Watch subsystem failed, stopping");
        signal.into()
    }

    fn interrupted(&mut self) -> Stopped {
        self.transition(DispatchState::Terminated);
        let stats = self.stats.snapshot();
        tracing::info!(
            runs = stats.runs_started,
            failed = stats.runs_failed,
            "Stopped watching"
        );
        Stopped::Interrupted
    }
}
