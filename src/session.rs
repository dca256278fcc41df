//! Startup sequence of a watch session.

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::runner::{CommandRunner, ProcessRunner};
use crate::watcher::{register_tree, Dispatcher, FixedWindow, FsWatcher, IgnoreSet, Stopped};
use crate::Result;

/// Watch `config.root` and re-run `config.command` on every change.
///
/// Returns when `shutdown` is cancelled or the watch subsystem fails.
///
/// # Errors
///
/// Returns an error if the notification backend cannot be created, the ignore
/// file cannot be read, the tree cannot be registered, or the backend reports
/// a failure while watching.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<Stopped> {
    tracing::info!("Running {}", config.command);
    tracing::info!("Press Ctrl-C to stop watching");

    let (mut watcher, streams) = FsWatcher::new()?;
    let mut runner = ProcessRunner::stdout().current_dir(&config.root);

    if config.run_on_start {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                tracing::info!("Shutdown requested during initial run");
                return Ok(Stopped::Interrupted);
            }
            _ = runner.run(&config.command) => {}
        }
    }

    let (ignores, _) = IgnoreSet::load(&config.ignore_path(), &config.vcs_dir)?;
    register_tree(&config.root, &ignores, &mut watcher)?;

    let mut dispatcher = Dispatcher::new(config.command, runner, FixedWindow, config.quiet_window);
    let stopped = dispatcher.run(streams, shutdown).await;

    drop(watcher);
    stopped
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Command;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(root: &Path, parts: &[&str], run_on_start: bool) -> Config {
        Config {
            root: root.to_path_buf(),
            command: Command::new(parts.iter().map(ToString::to_string).collect()).unwrap(),
            run_on_start,
            ..Config::default()
        }
    }

    fn cancelled() -> CancellationToken {
        let token = CancellationToken::new();
        token.cancel();
        token
    }

    #[tokio::test]
    async fn test_initial_run_happens_before_watching() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("marker");
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        let watched_marker = marker.clone();
        tokio::spawn(async move {
            for _ in 0..250 {
                if watched_marker.exists() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            stop.cancel();
        });

        let stopped = run(config(tmp.path(), &["touch", "marker"], true), shutdown)
            .await
            .unwrap();

        assert_eq!(stopped, Stopped::Interrupted);
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_no_initial_run() {
        let tmp = TempDir::new().unwrap();

        let stopped = run(config(tmp.path(), &["touch", "marker"], false), cancelled())
            .await
            .unwrap();

        assert_eq!(stopped, Stopped::Interrupted);
        assert!(!tmp.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_initial_run() {
        let tmp = TempDir::new().unwrap();

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            run(config(tmp.path(), &["sleep", "30"], true), cancelled()),
        )
        .await
        .expect("initial run was not interrupted")
        .unwrap();

        assert_eq!(stopped, Stopped::Interrupted);
    }

    #[tokio::test]
    async fn test_unreadable_ignore_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".gitignore")).unwrap();

        let result = run(config(tmp.path(), &["touch", "marker"], false), cancelled()).await;

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        let result = run(config(&missing, &["true"], false), cancelled()).await;

        assert!(matches!(result, Err(crate::Error::Watcher(_))));
    }
}
