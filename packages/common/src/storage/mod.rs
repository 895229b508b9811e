mod error;

pub mod deferred;
pub mod files;
pub mod uploads;

pub use deferred::DeferredDeletes;
pub use error::StorageError;
pub use files::{delete_if_exists, file_exists};
pub use uploads::{StoredFile, UploadFolder, UploadStore, UploadWriter, discard_uploads};
