use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::file_record;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(32)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("file_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create secondary indexes the entity definitions do not express.
///
/// Failures are logged, not returned: the service works without them.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    // Slot lookups: WHERE owner_id = ? AND category = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_file_owner_category")
        .table(file_record::Entity)
        .col(file_record::Column::OwnerId)
        .col(file_record::Column::Category)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_file_owner_category exists"),
        Err(e) => warn!("Failed to create index idx_file_owner_category: {}", e),
    }
}
