use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use super::error::StorageError;
use super::naming::{generate_name, validate_flat_filename};
use super::traits::{BlobStore, BoxReader, StoredBlob};

const STAGING_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs are stored flat under the root directory with generated names:
/// `{root}/{uuid}_{original name}`. Writes are staged in `{root}/.tmp` and
/// renamed into place once complete.
#[derive(Debug)]
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the root if needed.
    ///
    /// The root is resolved to an absolute path, so [`StoredBlob::path`] is
    /// absolute. Fails if the root cannot be created or is not writable.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        let root = fs::canonicalize(&root).await?;
        fs::create_dir_all(root.join(STAGING_DIR)).await?;

        let store = Self { root, max_size };
        store.probe_writable().await?;

        info!(root = %store.root.display(), max_size, "Blob storage initialized");
        Ok(store)
    }

    async fn probe_writable(&self) -> Result<(), StorageError> {
        let probe = self.temp_path();
        fs::write(&probe, b"probe").await?;
        fs::remove_file(&probe).await?;
        Ok(())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn stage(&self, mut reader: BoxReader, temp_path: &Path) -> Result<u64, StorageError> {
        let mut temp_file = fs::File::create(temp_path).await?;
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total_bytes)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_flat_filename(name)
            .map_err(|_| StorageError::InvalidName(name.to_string()))?;
        Ok(self.root.join(name))
    }

    async fn write(&self, name_hint: &str, reader: BoxReader) -> Result<StoredBlob, StorageError> {
        let name = generate_name(name_hint);
        let blob_path = self.path_for(&name)?;
        let temp_path = self.temp_path();

        let size = match self.stage(reader, &temp_path).await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(name = %name, size, "Blob written");
        Ok(StoredBlob {
            name,
            path: blob_path,
            size,
        })
    }

    async fn read(&self, name: &str) -> Result<BoxReader, StorageError> {
        let blob_path = self
            .path_for(name)
            .map_err(|_| StorageError::NotFound(name.to_string()))?;
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.into())),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(StorageError::NotReadable(name.into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let Ok(blob_path) = self.path_for(name) else {
            return Ok(false);
        };
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let blob_path = self.path_for(name)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => {
                debug!(name, "Blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, name: &str) -> Result<u64, StorageError> {
        let blob_path = self
            .path_for(name)
            .map_err(|_| StorageError::NotFound(name.to_string()))?;
        match fs::metadata(&blob_path).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(StorageError::NotFound(name.into())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.into())),
            Err(e) => Err(e.into()),
        }
    }
}
