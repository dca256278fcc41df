//! Post-run event draining.
//!
//! After a run starts, further events are usually part of the same logical
//! change (editor temp files, the run's own output). They are discarded
//! until the quiet window measured from the start of the drain has passed.
//! The window is fixed: new events do not extend it, so a burst longer than
//! the window can still cause one extra run.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use super::events::EventStream;

/// Capability used by the dispatch loop to absorb event bursts.
pub trait Debounce: Send {
    /// Discard events from `events` until the quiet window ends.
    ///
    /// Resolves to the number of events discarded.
    fn debounce(
        &mut self,
        events: &mut EventStream,
        quiet_window: Duration,
    ) -> impl Future<Output = usize> + Send;
}

/// Fixed-window drain, see [`drain_for`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWindow;

impl Debounce for FixedWindow {
    fn debounce(
        &mut self,
        events: &mut EventStream,
        quiet_window: Duration,
    ) -> impl Future<Output = usize> + Send {
        drain_for(events, quiet_window)
    }
}

/// Drain `events` for `quiet_window`, starting now.
///
/// If the stream closes early the rest of the window is still waited out.
pub async fn drain_for(events: &mut EventStream, quiet_window: Duration) -> usize {
    let timer = sleep(quiet_window);
    tokio::pin!(timer);

    let mut discarded = 0;
    let mut open = true;
    loop {
        tokio::select! {
            () = &mut timer => break,
            event = events.recv(), if open => match event {
                Some(event) => {
                    tracing::trace!(path = ?event.path(), "Discarded event");
                    discarded += 1;
                }
                None => open = false,
            },
        }
    }

    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::events::{watch_channel, ChangeEvent};
    use tokio::time::Instant;

    const WINDOW: Duration = Duration::from_millis(500);

    fn assert_window_elapsed(start: Instant) {
        let elapsed = start.elapsed();
        assert!(elapsed >= WINDOW, "returned early after {elapsed:?}");
        assert!(elapsed < WINDOW + Duration::from_millis(5), "overran: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_consumed_and_window_honored() {
        let (senders, mut streams) = watch_channel();
        for i in 0..5 {
            senders.events.send(ChangeEvent::new(format!("f{i}"))).unwrap();
        }

        let start = Instant::now();
        let discarded = drain_for(&mut streams.events, WINDOW).await;

        assert_eq!(discarded, 5);
        assert_window_elapsed(start);
        assert!(streams.events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_stream_waits_full_window() {
        let (_senders, mut streams) = watch_channel();

        let start = Instant::now();
        let discarded = drain_for(&mut streams.events, WINDOW).await;

        assert_eq!(discarded, 0);
        assert_window_elapsed(start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_do_not_reset_window() {
        let (senders, mut streams) = watch_channel();
        let tx = senders.events.clone();
        let base = Instant::now();
        tokio::spawn(async move {
            for ms in [100, 200, 300, 400, 450] {
                tokio::time::sleep_until(base + Duration::from_millis(ms)).await;
                let _ = tx.send(ChangeEvent::new("late"));
            }
        });

        let start = Instant::now();
        let discarded = drain_for(&mut streams.events, WINDOW).await;

        assert_window_elapsed(start);
        assert_eq!(discarded, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_after_window_stay_queued() {
        let (senders, mut streams) = watch_channel();
        let tx = senders.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(ChangeEvent::new("inside"));
            tokio::time::sleep(Duration::from_millis(600)).await;
            let _ = tx.send(ChangeEvent::new("outside"));
        });

        let discarded = drain_for(&mut streams.events, WINDOW).await;
        assert_eq!(discarded, 1);

        let next = streams.events.recv().await;
        assert_eq!(next, Some(ChangeEvent::new("outside")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_still_waits() {
        let (senders, mut streams) = watch_channel();
        senders.events.send(ChangeEvent::new("last")).unwrap();
        drop(senders);

        let start = Instant::now();
        let discarded = FixedWindow.debounce(&mut streams.events, WINDOW).await;

        assert_eq!(discarded, 1);
        assert_window_elapsed(start);
    }
}
