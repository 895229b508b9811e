use std::path::{Path, PathBuf};

use tracing::debug;

use super::files::delete_if_exists;

/// File paths scheduled for deletion once a database transaction commits.
///
/// Create one per logical operation. Register paths while the transaction
/// runs, then call [`DeferredDeletes::complete`] only after `commit()`
/// succeeded. If the transaction fails, drop the value instead: the files
/// stay on disk together with the rows that still reference them.
#[derive(Debug, Default)]
pub struct DeferredDeletes {
    paths: Vec<PathBuf>,
}

impl DeferredDeletes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `path` for deletion. Duplicates are tolerated.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Unschedule every registration equal to `path`.
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every registered file, best-effort.
    ///
    /// Each file is handled independently; a failure never stops the batch
    /// and never surfaces to the caller. Returns the number of files that
    /// were actually removed.
    pub async fn complete(self) -> usize {
        let mut deleted = 0;
        for path in &self.paths {
            if delete_if_exists(path).await {
                deleted += 1;
            }
        }
        debug!(
            registered = self.paths.len(),
            deleted, "Deferred file deletions completed"
        );
        deleted
    }
}
