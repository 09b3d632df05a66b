use std::fmt;
use std::io::Cursor;

use common::storage::BoxReader;

/// One file of an upload request.
pub struct UploadItem {
    /// Name supplied by the uploader.
    pub original_filename: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    pub reader: BoxReader,
}

impl UploadItem {
    pub fn new(
        original_filename: impl Into<String>,
        content_type: Option<String>,
        reader: BoxReader,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type,
            reader,
        }
    }

    /// Build an item from bytes already held in memory.
    pub fn from_bytes(
        original_filename: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let reader: BoxReader = Box::new(Cursor::new(data.into()));
        Self::new(original_filename, content_type, reader)
    }
}

impl fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadItem")
            .field("original_filename", &self.original_filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// An opened blob, ready to stream.
pub struct LoadedFile {
    /// Name the blob was resolved under.
    pub filename: String,
    /// Size on disk, when it could be determined.
    pub size: Option<u64>,
    pub reader: BoxReader,
}

impl fmt::Debug for LoadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFile")
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
