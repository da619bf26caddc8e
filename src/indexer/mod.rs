// Directory traversal and per-file embedding ingestion


pub mod ignore;

use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::database::{UpsertOutcome, VectorStore};
use crate::embeddings::Embedder;
use crate::{FileVectorError, Result};

pub use ignore::IgnoreSet;

/// Walks a directory tree and stores one embedding per regular file
pub struct Indexer<E> {
    embedder: E,
    store: VectorStore,
}

/// Counters collected during a single ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub directories_visited: usize,
    pub directories_failed: usize,
    pub files_inserted: usize,
    pub files_updated: usize,
    pub files_merged: usize,
    pub files_failed: usize,
}

impl IngestStats {
    #[inline]
    pub const fn files_stored(&self) -> usize {
        self.files_inserted + self.files_updated + self.files_merged
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.files_inserted += 1,
            UpsertOutcome::Updated => self.files_updated += 1,
            UpsertOutcome::Merged => self.files_merged += 1,
        }
    }
}

impl fmt::Display for IngestStats {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directories visited ({} unreadable), {} files stored ({} inserted, {} updated, {} merged), {} files failed",
            self.directories_visited,
            self.directories_failed,
            self.files_stored(),
            self.files_inserted,
            self.files_updated,
            self.files_merged,
            self.files_failed
        )
    }
}

/// Directories already walked, keyed by canonical path
#[derive(Debug, Default)]
struct VisitedDirs {
    seen: HashSet<PathBuf>,
}

impl VisitedDirs {
    /// Record `dir`, returning `false` if it was seen before under any spelling
    fn first_visit(&mut self, dir: &Path) -> bool {
        let key = dir
            .canonicalize()
            .unwrap_or_else(|_| absolute_path(dir).unwrap_or_else(|_| dir.to_path_buf()));
        self.seen.insert(key)
    }
}

/// Make `path` absolute and resolve `.` and `..` lexically, without
/// touching the filesystem or following symlinks
#[inline]
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

impl<E: Embedder> Indexer<E> {
    #[inline]
    pub const fn new(embedder: E, store: VectorStore) -> Self {
        Self { embedder, store }
    }

    #[inline]
    pub const fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Ingest every regular file below `root`.
    ///
    /// Hidden entries (other than the root itself) and entries in `ignore` are
    /// pruned together with everything below them. Symbolic links are not
    /// followed and each directory is processed at most once. A file that
    /// cannot be read, embedded or stored is reported and skipped.
    #[inline]
    pub async fn ingest_directory(&self, root: &Path, ignore: &IgnoreSet) -> Result<IngestStats> {
        let root = absolute_path(root)?;
        if !root.is_dir() {
            return Err(FileVectorError::InvalidRoot(root));
        }

        info!(
            "Ingesting {} with model {} into table {}",
            root.display(),
            self.embedder.model_name(),
            self.store.table_name()
        );

        let mut stats = IngestStats::default();
        let mut visited = VisitedDirs::default();
        let bar = progress_bar();

        let mut walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_pruned(entry, ignore));

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    if path.is_dir() {
                        warn!("Failed to read directory {}: {}", path.display(), e);
                        stats.directories_failed += 1;
                        bar.suspend(|| {
                            println!("Failed to read directory {}: {}", path.display(), e);
                        });
                    } else {
                        warn!("Failed to read entry {}: {}", path.display(), e);
                        stats.files_failed += 1;
                        bar.suspend(|| {
                            println!("Failed to process file {}: {}", path.display(), e);
                        });
                    }
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if !visited.first_visit(entry.path()) {
                    debug!("Directory {} already visited", entry.path().display());
                    walker.skip_current_dir();
                    continue;
                }

                stats.directories_visited += 1;
                bar.suspend(|| println!("Processing directory: {}", entry.path().display()));
                continue;
            }

            if !is_regular_file(&entry) {
                debug!("Skipping non-regular entry {}", entry.path().display());
                continue;
            }

            let path = entry.path();
            bar.set_message(path.display().to_string());

            match self.ingest_file(path).await {
                Ok(outcome) => {
                    stats.record(outcome);
                    bar.suspend(|| println!("{} embedding for file: {}", outcome, path.display()));
                }
                Err(FileVectorError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    warn!("File {} disappeared before it was read", path.display());
                    stats.files_failed += 1;
                    bar.suspend(|| println!("File not found: {}", path.display()));
                }
                Err(e) => {
                    warn!("Failed to process file {}: {}", path.display(), e);
                    stats.files_failed += 1;
                    bar.suspend(|| println!("Failed to process file {}: {}", path.display(), e));
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!("Ingestion of {} finished: {}", root.display(), stats);
        Ok(stats)
    }

    /// Read, embed and store a single file under its path
    #[inline]
    pub async fn ingest_file(&self, path: &Path) -> Result<UpsertOutcome> {
        let file_path = path.to_str().ok_or_else(|| {
            FileVectorError::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                "path is not valid UTF-8",
            ))
        })?;

        let content = fs::read_to_string(path).await?;
        debug!("Read {} bytes from {}", content.len(), file_path);

        let embedding = self.embedder.embed(&content)?;
        self.store.upsert(file_path, &embedding).await
    }
}

fn is_pruned(entry: &DirEntry, ignore: &IgnoreSet) -> bool {
    if ignore.contains(entry.path()) {
        debug!("Ignoring {}", entry.path().display());
        return true;
    }

    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

#[expect(
    clippy::filetype_is_file,
    reason = "only regular files are read; symlinks and special files are skipped"
)]
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
}

fn progress_bar() -> ProgressBar {
    if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} [{pos}] Ingesting {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
    } else {
        ProgressBar::hidden()
    }
}
