use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Location and length of a blob after a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Generated name, unique within the storage root.
    pub name: String,
    /// Full path of the blob on disk.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

/// Name-addressed blob storage rooted at one directory.
///
/// Every blob lives directly under the root; names are flat filenames.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Directory all blobs are stored under.
    fn root(&self) -> &Path;

    /// Path a blob with the given name would occupy.
    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError>;

    /// Store bytes under a name derived from `name_hint`.
    async fn write_bytes(&self, name_hint: &str, data: &[u8]) -> Result<StoredBlob, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.write(name_hint, reader).await
    }

    /// Stream a reader into a new blob named after `name_hint`.
    ///
    /// The blob only becomes visible under its final name once the whole
    /// stream has been written.
    async fn write(&self, name_hint: &str, reader: BoxReader) -> Result<StoredBlob, StorageError>;

    /// Retrieve all bytes of a blob.
    async fn read_to_vec(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.read(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a blob as a streaming async reader.
    async fn read(&self, name: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete a blob by name.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, name: &str) -> Result<u64, StorageError>;
}
