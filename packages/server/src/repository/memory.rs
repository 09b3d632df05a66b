use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use common::FileCategory;
use sea_orm::DbErr;
use tokio::sync::RwLock;

use super::FileRepository;
use crate::models::file::{FileRecord, NewFileRecord};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, FileRecord>,
}

/// Process-local [`FileRepository`], used by tests and embedded setups.
#[derive(Default)]
pub struct InMemoryFileRepository {
    table: RwLock<Table>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, DbErr> {
        let mut table = self.table.write().await;

        if table.rows.values().any(|r| r.filename == record.filename) {
            return Err(DbErr::RecordNotInserted);
        }

        table.next_id += 1;
        let now = Utc::now();
        let stored = FileRecord {
            id: table.next_id,
            owner_id: record.owner_id,
            filename: record.filename,
            original_filename: record.original_filename,
            content_type: record.content_type,
            file_path: record.file_path,
            size: record.size,
            category: record.category,
            created_date: now,
            last_modified_date: now,
        };
        table.rows.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, DbErr> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, DbErr> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|r| r.filename == filename)
            .cloned())
    }

    async fn find_by_owner_and_category(
        &self,
        owner_id: i64,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>, DbErr> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|r| r.owner_id == owner_id && r.category == category)
            .cloned()
            .collect())
    }

    async fn exists_by_owner_and_original_filename(
        &self,
        owner_id: i64,
        original_filename: &str,
    ) -> Result<bool, DbErr> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .any(|r| r.owner_id == owner_id && r.original_filename == original_filename))
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<bool, DbErr> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, r| r.filename != filename);
        Ok(table.rows.len() < before)
    }
}
