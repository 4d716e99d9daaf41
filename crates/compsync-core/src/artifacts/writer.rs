//! Change-detecting artifact persistence.
//!
//! An [`ArtifactWriter`] remembers the last path and text it wrote and only
//! touches the file system when either differs. Bookkeeping is updated only
//! after a successful write, so a failed write is retried by the next sync.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// What a sync did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New contents were written
    Written,
    /// The file already held this exact text
    Unchanged,
    /// The artifact was disabled and its previous file removed
    Removed,
    /// Disabled with no previous output; nothing to do
    Skipped,
}

#[derive(Debug, Clone)]
struct LastWrite {
    path: PathBuf,
    text: String,
}

/// Persists one artifact kind.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    last: Mutex<Option<LastWrite>>,
    writes: AtomicU64,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this writer currently owns a file on disk.
    pub fn has_prior_output(&self) -> bool {
        self.last.lock().is_some()
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.last.lock().as_ref().map(|l| l.path.clone())
    }

    /// Number of file writes performed so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Bring the file system in line with `target`.
    ///
    /// `None` means the artifact is disabled: the previously written file, if
    /// any, is removed. A changed destination removes the old file.
    pub async fn sync(&self, target: Option<(&Path, &str)>) -> Result<WriteOutcome, SyncError> {
        let last = self.last.lock().clone();

        let Some((path, text)) = target else {
            return Ok(match last {
                Some(last) => {
                    remove_best_effort(&last.path).await;
                    *self.last.lock() = None;
                    WriteOutcome::Removed
                }
                None => WriteOutcome::Skipped,
            });
        };

        match &last {
            Some(last) if last.path == path && last.text == text => {
                return Ok(WriteOutcome::Unchanged);
            }
            Some(last) if last.path != path => {
                remove_best_effort(&last.path).await;
            }
            Some(_) => {}
            None => {
                // Cold start: an identical file from an earlier run is kept.
                if let Ok(existing) = tokio::fs::read_to_string(path).await {
                    if existing == text {
                        debug!(path = %path.display(), "artifact already up to date");
                        self.record(path, text);
                        return Ok(WriteOutcome::Unchanged);
                    }
                }
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::create_dir(parent, e))?;
        }
        tokio::fs::write(path, text)
            .await
            .map_err(|e| SyncError::write(path, e))?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        self.record(path, text);
        info!(path = %path.display(), bytes = text.len(), "wrote artifact");
        Ok(WriteOutcome::Written)
    }

    fn record(&self, path: &Path, text: &str) {
        *self.last.lock() = Some(LastWrite {
            path: path.to_path_buf(),
            text: text.to_string(),
        });
    }
}

async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "removed stale artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_second_identical_sync_does_not_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/manifest.json");
        let writer = ArtifactWriter::new();

        assert_eq!(writer.sync(Some((path.as_path(), "{}"))).await.unwrap(), WriteOutcome::Written);
        assert_eq!(writer.sync(Some((path.as_path(), "{}"))).await.unwrap(), WriteOutcome::Unchanged);
        assert_eq!(writer.write_count(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_cold_start_matches_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        std::fs::write(&path, "{}").unwrap();

        let writer = ArtifactWriter::new();
        assert_eq!(writer.sync(Some((path.as_path(), "{}"))).await.unwrap(), WriteOutcome::Unchanged);
        assert_eq!(writer.write_count(), 0);
        assert!(writer.has_prior_output());
    }

    #[tokio::test]
    async fn test_moved_destination_removes_old_file() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("a.json");
        let new = temp.path().join("b.json");
        let writer = ArtifactWriter::new();

        writer.sync(Some((old.as_path(), "{}"))).await.unwrap();
        writer.sync(Some((new.as_path(), "{}"))).await.unwrap();

        assert!(!old.exists());
        assert!(new.exists());
        assert_eq!(writer.last_path(), Some(new));
    }

    #[tokio::test]
    async fn test_disable_removes_then_skips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.json");
        let writer = ArtifactWriter::new();

        writer.sync(Some((path.as_path(), "{}"))).await.unwrap();
        assert_eq!(writer.sync(None).await.unwrap(), WriteOutcome::Removed);
        assert!(!path.exists());
        assert_eq!(writer.sync(None).await.unwrap(), WriteOutcome::Skipped);
        assert!(!writer.has_prior_output());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_bookkeeping() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("a.json");
        let writer = ArtifactWriter::new();

        assert!(writer.sync(Some((path.as_path(), "{}"))).await.is_err());
        assert!(!writer.has_prior_output());
        assert_eq!(writer.write_count(), 0);
    }
}
