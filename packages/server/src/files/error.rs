use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotReadable(String),

    #[error("File with name '{original_filename}' already exists for owner {owner_id}")]
    DuplicateFile {
        owner_id: i64,
        original_filename: String,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<DbErr> for FileError {
    fn from(err: DbErr) -> Self {
        FileError::StorageFailure(format!("metadata store error: {err}"))
    }
}

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => FileError::NotFound(format!("File not found: {name}")),
            StorageError::NotReadable(name) => {
                FileError::NotReadable(format!("File is not readable: {name}"))
            }
            StorageError::InvalidName(_) | StorageError::SizeLimitExceeded { .. } => {
                FileError::Invalid(err.to_string())
            }
            StorageError::Io(_) => FileError::StorageFailure(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FileError>;
