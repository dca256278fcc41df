//! Registers the watch root and every non-ignored directory below it.
//!
//! Runs once at startup. Directories created later are not picked up.

use std::path::Path;

use walkdir::WalkDir;

use super::ignore::IgnoreSet;
use crate::error::WatcherError;
use crate::Result;

/// Something that can start watching a directory.
pub trait WatchRegistry {
    /// Register `path` for change notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be watched.
    fn register(&mut self, path: &Path) -> Result<()>;
}

impl<F> WatchRegistry for F
where
    F: FnMut(&Path) -> Result<()>,
{
    fn register(&mut self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// Outcome of a successful registration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// Directories registered, the root included.
    pub registered: usize,
    /// Directories skipped (with their subtrees) because of an ignore prefix.
    pub pruned: usize,
}

/// Register `root` and all directories under it that `ignores` does not prune.
///
/// The root is always registered first, whatever the ignore rules say.
///
/// # Errors
///
/// Returns an error if registering any directory fails or the walk hits an
/// unreadable or vanished entry. Nothing is rolled back.
pub fn register_tree<R>(
    root: &Path,
    ignores: &IgnoreSet,
    registry: &mut R,
) -> Result<RegistrationSummary>
where
    R: WatchRegistry + ?Sized,
{
    let mut summary = RegistrationSummary::default();

    registry.register(root)?;
    summary.registered += 1;

    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| WatcherError::Walk {
            path: e.path().unwrap_or(root).display().to_string(),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if ignores.is_ignored(relative) {
            tracing::debug!(path = %relative.display(), "Pruned ignored directory");
            summary.pruned += 1;
            walker.skip_current_dir();
            continue;
        }

        registry.register(entry.path())?;
        summary.registered += 1;
    }

    tracing::info!(
        root = %root.display(),
        registered = summary.registered,
        pruned = summary.pruned,
        "Watch tree registered"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ignores(lines: &str) -> IgnoreSet {
        IgnoreSet::from_reader(Some(Cursor::new(lines)), ".git").unwrap()
    }

    fn collect(root: &Path, set: &IgnoreSet) -> (Vec<PathBuf>, RegistrationSummary) {
        let mut registered = Vec::new();
        let summary = register_tree(root, set, &mut |p: &Path| -> Result<()> {
            registered.push(p.to_path_buf());
            Ok(())
        })
        .unwrap();
        (registered, summary)
    }

    #[test]
    fn test_registers_root_first_and_all_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("src/main.rs"), "fn main() {}").unwrap();

        let (registered, summary) = collect(tmp.path(), &ignores(""));

        assert_eq!(registered[0], tmp.path());
        assert!(registered.contains(&tmp.path().join("src")));
        assert!(registered.contains(&tmp.path().join("src/nested")));
        assert!(registered.contains(&tmp.path().join("docs")));
        assert!(!registered.contains(&tmp.path().join("src/main.rs")));
        assert_eq!(summary.registered, 4);
        assert_eq!(summary.pruned, 0);
    }

    #[test]
    fn test_prunes_ignored_subtrees() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg/lib")).unwrap();
        fs::create_dir_all(tmp.path().join(".git/objects")).unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();

        let (registered, summary) = collect(tmp.path(), &ignores("node_modules\n"));

        assert_eq!(registered, vec![tmp.path().to_path_buf(), tmp.path().join("src")]);
        assert_eq!(summary.pruned, 2);
    }

    #[test]
    fn test_root_registered_even_if_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("thing");
        fs::create_dir_all(root.join("inner")).unwrap();

        let (registered, _) = collect(&root, &ignores("thing\n"));

        assert_eq!(registered[0], root);
        assert!(registered.contains(&root.join("inner")));
    }

    #[test]
    fn test_root_registration_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();

        let mut calls = 0;
        let result = register_tree(tmp.path(), &ignores(""), &mut |p: &Path| -> Result<()> {
            calls += 1;
            Err(WatcherError::watch_failed(p, "refused").into())
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_nested_registration_failure_aborts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("bad")).unwrap();
        let bad = tmp.path().join("bad");

        let result = register_tree(tmp.path(), &ignores(""), &mut |p: &Path| -> Result<()> {
            if p == bad {
                Err(WatcherError::watch_failed(p, "limit reached").into())
            } else {
                Ok(())
            }
        });

        let err = result.unwrap_err();
        assert!(err.to_string().contains("limit reached"));
    }

    #[test]
    fn test_missing_root_walk_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        let mut accept = |_: &Path| -> Result<()> { Ok(()) };
        let result = register_tree(&missing, &ignores(""), &mut accept);

        assert!(matches!(
            result,
            Err(crate::Error::Watcher(WatcherError::Walk { .. }))
        ));
    }
}
