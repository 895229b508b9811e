use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::StorageError;
use super::files::delete_if_exists;

/// Sub-directory of the upload root a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    /// Recipe main images, gallery images and comment images.
    Recipes,
    /// User avatars.
    Avatars,
}

impl UploadFolder {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Avatars => "current",
        }
    }
}

/// A file written to the upload root while receiving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Multipart field the file arrived in.
    pub field: String,
    pub folder: UploadFolder,
    /// Generated name persisted in the database.
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Local directory tree holding every uploaded file.
///
/// Layout: `{root}/recipes/{name}` and `{root}/current/{name}`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_size: u64,
}

impl UploadStore {
    /// Create the store, making sure every folder exists.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        for folder in [UploadFolder::Recipes, UploadFolder::Avatars] {
            fs::create_dir_all(root.join(folder.dir_name())).await?;
        }
        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Absolute location of a stored file name.
    pub fn path_for(&self, folder: UploadFolder, file_name: &str) -> PathBuf {
        self.root.join(folder.dir_name()).join(file_name)
    }

    /// Write `data` under a freshly generated name.
    pub async fn put(
        &self,
        folder: UploadFolder,
        field: &str,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let mut writer = self.writer(folder, field, original_name).await?;
        if let Err(e) = writer.write(data).await {
            writer.abort().await;
            return Err(e);
        }
        writer.finish().await
    }

    /// Open a streaming writer for a new upload.
    pub async fn writer(
        &self,
        folder: UploadFolder,
        field: &str,
        original_name: Option<&str>,
    ) -> Result<UploadWriter, StorageError> {
        let file_name = generate_file_name(field, original_name);
        let path = self.path_for(folder, &file_name);
        let file = fs::File::create(&path).await?;
        Ok(UploadWriter {
            file,
            stored: StoredFile {
                field: field.to_string(),
                folder,
                file_name,
                path,
                size: 0,
            },
            max_size: self.max_size,
        })
    }
}

/// In-progress upload. Call [`UploadWriter::finish`] or [`UploadWriter::abort`].
pub struct UploadWriter {
    file: fs::File,
    stored: StoredFile,
    max_size: u64,
}

impl UploadWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let size = self.stored.size + chunk.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }
        self.file.write_all(chunk).await?;
        self.stored.size = size;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile, StorageError> {
        if let Err(e) = self.file.flush().await {
            delete_if_exists(&self.stored.path).await;
            return Err(e.into());
        }
        Ok(self.stored)
    }

    /// Drop the partially written file.
    pub async fn abort(self) {
        let UploadWriter { file, stored, .. } = self;
        drop(file);
        delete_if_exists(&stored.path).await;
    }
}

/// Delete files written for a request that was rejected before any database
/// write. Best-effort: failures are ignored so the original error reaches
/// the caller unchanged.
pub async fn discard_uploads<'a>(files: impl IntoIterator<Item = &'a StoredFile>) {
    for file in files {
        delete_if_exists(&file.path).await;
    }
}

/// `{field}-{unix millis}-{random}{.ext}`, with the extension taken from the
/// client-supplied name and reduced to ASCII alphanumerics.
fn generate_file_name(field: &str, original_name: Option<&str>) -> String {
    let field: String = field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let field = if field.is_empty() { "file".to_string() } else { field };

    let suffix = rand::rng().random_range(0..1_000_000_000u32);
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(10)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    format!(
        "{field}-{}-{suffix}{extension}",
        Utc::now().timestamp_millis()
    )
}
