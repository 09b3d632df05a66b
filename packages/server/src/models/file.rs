use chrono::{DateTime, Utc};
use common::FileCategory;
use serde::{Deserialize, Serialize};

use crate::entity::file_record;

/// Content type recorded when the uploader did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata of one stored file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FileRecord {
    /// Record ID assigned by the metadata store.
    #[schema(example = 42)]
    pub id: i64,
    /// Logical owner of the file (e.g. a book).
    #[schema(example = 7)]
    pub owner_id: i64,
    /// Generated, storage-unique name used to fetch the bytes.
    #[schema(example = "0b6f3c1e-5d2a-4f7e-9a44-2c1d8e9b7a10_cover.png")]
    pub filename: String,
    /// Name supplied by the uploader.
    #[schema(example = "cover.png")]
    pub original_filename: String,
    /// MIME content type.
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Where the bytes live on disk.
    #[schema(example = "uploads/0b6f3c1e-5d2a-4f7e-9a44-2c1d8e9b7a10_cover.png")]
    pub file_path: String,
    /// Size in bytes.
    #[schema(example = 1024)]
    pub size: i64,
    pub category: FileCategory,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

/// A record about to be inserted; the metadata store assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFileRecord {
    pub owner_id: i64,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_path: String,
    pub size: i64,
    pub category: FileCategory,
}

/// Response DTO for listing files.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileRecord>,
    pub total: u64,
}

impl From<Vec<FileRecord>> for FileListResponse {
    fn from(files: Vec<FileRecord>) -> Self {
        let total = files.len() as u64;
        Self { files, total }
    }
}

/// Query parameters identifying a slot for uploads.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    /// Owner of the uploaded files.
    pub owner_id: i64,
    /// Category the files are stored under.
    pub category: FileCategory,
}

impl From<file_record::Model> for FileRecord {
    fn from(model: file_record::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            filename: model.filename,
            original_filename: model.original_filename,
            content_type: model.content_type,
            file_path: model.file_path,
            size: model.size,
            category: model.category,
            created_date: model.created_date,
            last_modified_date: model.last_modified_date,
        }
    }
}
