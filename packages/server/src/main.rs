use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use file_server::config::AppConfig;
use file_server::database;
use file_server::files::FileService;
use file_server::repository::SeaOrmFileRepository;
use file_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let blobs = FilesystemBlobStore::new(
        config.storage.root_dir.clone(),
        config.storage.max_blob_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to initialize blob storage at {}",
            config.storage.root_dir.display()
        )
    })?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    database::ensure_indexes(&db).await;

    let files = FileService::new(
        Arc::new(blobs),
        Arc::new(SeaOrmFileRepository::new(db)),
        &config.files,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = file_server::build_router(AppState {
        files: Arc::new(files),
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
