#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::absolute_path;
use crate::Result;

/// Absolute paths of files and directories excluded from ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    paths: HashSet<PathBuf>,
}

impl IgnoreSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from paths, resolving relative ones against the current
    /// directory and collapsing `.` and `..`
    #[inline]
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref();
                absolute_path(path).unwrap_or_else(|_| path.to_path_buf())
            })
            .collect();
        Self { paths }
    }

    /// Parse newline-separated paths; blank lines are skipped
    #[inline]
    pub fn parse(content: &str) -> Self {
        Self::from_paths(content.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    /// Read an ignore list file.
    ///
    /// Returns `Ok(None)` when the file does not exist so the caller can
    /// report it and carry on with an empty set.
    #[inline]
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let set = Self::parse(&content);
                debug!("Loaded {} ignore entries from {}", set.len(), path.display());
                Ok(Some(set))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}
