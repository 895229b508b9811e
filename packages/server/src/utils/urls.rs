//! Stored file name -> public URL.

use common::storage::UploadFolder;

pub fn upload_url(public_url: &str, folder: UploadFolder, file_name: &str) -> String {
    format!(
        "{}/uploads/{}/{}",
        public_url.trim_end_matches('/'),
        folder.dir_name(),
        file_name
    )
}

pub fn recipe_image_url(public_url: &str, file_name: &str) -> String {
    upload_url(public_url, UploadFolder::Recipes, file_name)
}

pub fn avatar_url(public_url: &str, file_name: &str) -> String {
    upload_url(public_url, UploadFolder::Avatars, file_name)
}
