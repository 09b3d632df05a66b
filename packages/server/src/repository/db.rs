use async_trait::async_trait;
use chrono::Utc;
use common::FileCategory;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::FileRepository;
use crate::entity::file_record;
use crate::models::file::{FileRecord, NewFileRecord};

/// [`FileRepository`] backed by the `file` table.
#[derive(Clone)]
pub struct SeaOrmFileRepository {
    db: DatabaseConnection,
}

impl SeaOrmFileRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileRepository for SeaOrmFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, DbErr> {
        let now = Utc::now();
        let model = file_record::ActiveModel {
            owner_id: Set(record.owner_id),
            filename: Set(record.filename),
            original_filename: Set(record.original_filename),
            content_type: Set(record.content_type),
            file_path: Set(record.file_path),
            size: Set(record.size),
            category: Set(record.category),
            created_date: Set(now),
            last_modified_date: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, DbErr> {
        Ok(file_record::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(FileRecord::from))
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, DbErr> {
        Ok(file_record::Entity::find()
            .filter(file_record::Column::Filename.eq(filename))
            .one(&self.db)
            .await?
            .map(FileRecord::from))
    }

    async fn find_by_owner_and_category(
        &self,
        owner_id: i64,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>, DbErr> {
        let models = file_record::Entity::find()
            .filter(file_record::Column::OwnerId.eq(owner_id))
            .filter(file_record::Column::Category.eq(category))
            .order_by_asc(file_record::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(FileRecord::from).collect())
    }

    async fn exists_by_owner_and_original_filename(
        &self,
        owner_id: i64,
        original_filename: &str,
    ) -> Result<bool, DbErr> {
        let count = file_record::Entity::find()
            .filter(file_record::Column::OwnerId.eq(owner_id))
            .filter(file_record::Column::OriginalFilename.eq(original_filename))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<bool, DbErr> {
        let result = file_record::Entity::delete_many()
            .filter(file_record::Column::Filename.eq(filename))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
