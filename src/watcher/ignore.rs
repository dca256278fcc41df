//! Ignore prefixes read from a gitignore-style file.
//!
//! Each accepted line is a literal path prefix, compared against a
//! directory's path relative to the watch root. This is not gitignore glob
//! matching: negation, wildcards, anchors and `**` are taken literally.
//! Matching is on raw strings, so `thing` also prunes `thing2/`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Component, Path};

use crate::Result;

/// Set of path prefixes excluded from watch registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    prefixes: BTreeSet<String>,
}

impl IgnoreSet {
    /// Set holding only the version-control directory.
    pub fn with_vcs_dir(vcs_dir: impl Into<String>) -> Self {
        Self {
            prefixes: BTreeSet::from([vcs_dir.into()]),
        }
    }

    /// Build a set from an optional ignore source.
    ///
    /// Lines are trimmed and lose one leading `/`. Blank lines and `#`
    /// comments are skipped; everything else is accepted as-is. Bytes that
    /// are not UTF-8 are replaced, never rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `source` fails.
    pub fn from_reader<R: BufRead>(source: Option<R>, vcs_dir: &str) -> Result<Self> {
        let mut set = Self::with_vcs_dir(vcs_dir);
        let Some(source) = source else {
            return Ok(set);
        };

        for line in source.split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            let line = line.strip_prefix('/').unwrap_or(line);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            set.prefixes.insert(line.to_string());
        }

        Ok(set)
    }

    /// Load the ignore file at `path`.
    ///
    /// A missing file is not an error: the default set is returned and the
    /// flag is `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be opened or read.
    pub fn load(path: &Path, vcs_dir: &str) -> Result<(Self, bool)> {
        match File::open(path) {
            Ok(file) => {
                let set = Self::from_reader(Some(BufReader::new(file)), vcs_dir)?;
                tracing::info!(
                    path = %path.display(),
                    prefixes = set.len(),
                    "Loaded ignore file"
                );
                Ok((set, true))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No ignore file found");
                Ok((Self::with_vcs_dir(vcs_dir), false))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a root-relative path starts with any ignore prefix.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let relative = normalize(relative);
        self.prefixes
            .iter()
            .any(|prefix| relative.starts_with(prefix.as_str()))
    }

    /// Whether `prefix` is in the set.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Iterate prefixes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    /// Number of prefixes, the version-control directory included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Always false; the version-control directory is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Render a relative path with `/` separators on every platform.
fn normalize(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
