use serde::Deserialize;

/// Upload storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for uploaded files. Default: "./public/uploads".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Base URL prepended to `/uploads/...` in responses. Default: "http://127.0.0.1:5000".
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Maximum size of a single uploaded file in bytes. Default: 10 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_upload_dir() -> String {
    "./public/uploads".into()
}
fn default_public_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_url: default_public_url(),
            max_file_size: default_max_file_size(),
        }
    }
}
