use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Directory blobs are stored under; created on startup. Default: "uploads".
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Largest accepted blob in bytes. Default: 50 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_max_blob_size() -> u64 {
    50 * 1024 * 1024
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            max_blob_size: default_max_blob_size(),
        }
    }
}
