use thiserror::Error;

/// Errors that can occur while writing uploaded files.
///
/// Deleting files never produces one of these: cleanup is best-effort and
/// reported as a `bool` by [`super::files::delete_if_exists`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The upload exceeds the configured size limit.
    #[error("upload exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
