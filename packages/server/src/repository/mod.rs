//! Metadata store for file records.
//!
//! The coordinator only talks to [`FileRepository`]; the persistence engine
//! behind it is interchangeable.

mod db;
mod memory;

use async_trait::async_trait;
use common::FileCategory;
use sea_orm::DbErr;

use crate::models::file::{FileRecord, NewFileRecord};

pub use db::SeaOrmFileRepository;
pub use memory::InMemoryFileRepository;

/// Persistence of [`FileRecord`]s.
///
/// Implementations assign ids and timestamps and serialize their own writes.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record. Fails if `filename` is already taken.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, DbErr>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, DbErr>;

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, DbErr>;

    /// All records of a slot, ordered by id.
    async fn find_by_owner_and_category(
        &self,
        owner_id: i64,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>, DbErr>;

    /// Whether the owner already has a file uploaded under this original name.
    async fn exists_by_owner_and_original_filename(
        &self,
        owner_id: i64,
        original_filename: &str,
    ) -> Result<bool, DbErr>;

    /// Delete the record with this filename.
    ///
    /// Returns `true` if a record was deleted.
    async fn delete_by_filename(&self, filename: &str) -> Result<bool, DbErr>;
}
