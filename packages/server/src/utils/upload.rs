use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::storage::{StoredFile, UploadFolder, UploadStore, discard_uploads};

use crate::error::AppError;

/// A file-carrying multipart field and how many files it may hold.
#[derive(Debug, Clone, Copy)]
pub struct FileSlot {
    pub name: &'static str,
    pub max_count: usize,
}

impl FileSlot {
    pub const fn new(name: &'static str, max_count: usize) -> Self {
        Self { name, max_count }
    }
}

pub const MAIN_IMAGE: FileSlot = FileSlot::new("mainImage", 1);
pub const IMAGES: FileSlot = FileSlot::new("images", 10);
pub const AVATAR: FileSlot = FileSlot::new("avatar", 1);

/// Text fields and stored files of a received multipart form.
///
/// Files are already on disk. A handler that rejects the request must call
/// [`UploadedForm::discard`] before returning.
#[derive(Debug, Default)]
pub struct UploadedForm {
    fields: HashMap<String, String>,
    files: Vec<StoredFile>,
}

impl UploadedForm {
    /// Trimmed text field; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn files(&self) -> &[StoredFile] {
        &self.files
    }

    pub fn files_in<'a>(&'a self, slot: &'a str) -> impl Iterator<Item = &'a StoredFile> + 'a {
        self.files.iter().filter(move |f| f.field == slot)
    }

    pub fn first_file<'a>(&'a self, slot: &'a str) -> Option<&'a StoredFile> {
        self.files_in(slot).next()
    }

    /// Delete every stored file of this form.
    pub async fn discard(&self) {
        if !self.files.is_empty() {
            tracing::debug!(count = self.files.len(), "Discarding uploads of rejected request");
        }
        discard_uploads(&self.files).await;
    }

    /// Parse a JSON array field such as `tagsId` or `imagesId`.
    pub fn json_list<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<Vec<T>>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| AppError::Validation(format!("{name} must be a JSON array: {e}"))),
        }
    }
}

/// Receive a multipart form, writing files of the allowed slots into `folder`.
///
/// On any failure the files written so far are deleted before the error is
/// returned.
pub async fn receive_form(
    mut multipart: Multipart,
    store: &UploadStore,
    folder: UploadFolder,
    slots: &[FileSlot],
) -> Result<UploadedForm, AppError> {
    let mut form = UploadedForm::default();
    let result = read_fields(&mut multipart, store, folder, slots, &mut form).await;
    match result {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    store: &UploadStore,
    folder: UploadFolder,
    slots: &[FileSlot],
    form: &mut UploadedForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_none() {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
            form.fields.insert(name, text);
            continue;
        }

        let slot = slots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::Validation(format!("Unexpected file field '{name}'")))?;
        if form.files_in(slot.name).count() >= slot.max_count {
            return Err(AppError::Validation(format!(
                "Too many files in '{name}': max {}",
                slot.max_count
            )));
        }

        let stored = store_field(field, store, folder, slot.name).await?;
        form.files.push(stored);
    }
    Ok(())
}

async fn store_field(
    mut field: Field<'_>,
    store: &UploadStore,
    folder: UploadFolder,
    slot: &str,
) -> Result<StoredFile, AppError> {
    let original_name = field.file_name().map(str::to_string);
    let mut writer = store.writer(folder, slot, original_name.as_deref()).await?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                writer.abort().await;
                return Err(AppError::Validation(format!("Upload read error: {e}")));
            }
        };
        if let Err(e) = writer.write(&chunk).await {
            writer.abort().await;
            return Err(e.into());
        }
    }

    Ok(writer.finish().await?)
}
