//! Coordination of blob bytes and file metadata.

mod duplicate;
mod error;
mod service;
mod slots;
mod upload;


pub use duplicate::DuplicatePolicy;
pub use error::{FileError, Result};
pub use service::FileService;
pub use slots::{SlotGuard, SlotLocks};
pub use upload::{LoadedFile, UploadItem};
