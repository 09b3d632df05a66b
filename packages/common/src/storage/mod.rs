mod error;
mod traits;

pub mod filesystem;
pub mod naming;

pub use error::StorageError;
pub use filesystem::FilesystemBlobStore;
pub use traits::{BlobStore, BoxReader, StoredBlob};
