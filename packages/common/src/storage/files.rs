//! Non-raising filesystem primitives.
//!
//! Both functions swallow every I/O error. Callers must never treat a
//! `false` return as fatal.

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

/// Check whether `path` exists. Unreadable paths count as missing.
pub async fn file_exists(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    fs::try_exists(path).await.unwrap_or(false)
}

/// Delete the file at `path` if it exists.
///
/// Returns `true` if a file was removed, `false` if it was missing or could
/// not be removed.
pub async fn delete_if_exists(path: &Path) -> bool {
    if !file_exists(path).await {
        return false;
    }
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Deleted file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete file");
            false
        }
    }
}
