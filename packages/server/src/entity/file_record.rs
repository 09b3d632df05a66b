use common::FileCategory;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Logical owner (e.g. a book id). Always positive.
    pub owner_id: i64,

    /// Generated storage name; the blob lives at `{root}/{filename}`.
    #[sea_orm(unique)]
    pub filename: String,

    /// Name supplied by the uploader.
    pub original_filename: String,

    pub content_type: String,

    pub file_path: String,

    /// Byte length of the blob. Always positive.
    pub size: i64,

    pub category: FileCategory,

    pub created_date: DateTimeUtc,

    pub last_modified_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
