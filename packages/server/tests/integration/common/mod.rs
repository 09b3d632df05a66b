use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

use ::common::storage::FilesystemBlobStore;
use file_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, FilesConfig, ServerConfig, StorageAppConfig,
};
use file_server::files::FileService;
use file_server::repository::InMemoryFileRepository;
use file_server::state::AppState;

pub mod routes {
    pub fn slot_query(owner_id: i64, category: &str) -> String {
        format!("/api/v1/files?owner_id={owner_id}&category={category}")
    }

    pub fn file(filename: &str) -> String {
        format!("/api/v1/files/{filename}")
    }

    pub fn file_by_id(id: i64) -> String {
        format!("/api/v1/files/id/{id}")
    }

    pub fn slot(category: &str, owner_id: i64) -> String {
        format!("/api/v1/files/{category}/{owner_id}")
    }
}

/// Largest blob the test server accepts.
pub const MAX_BLOB_SIZE: u64 = 64 * 1024;

/// A running test server backed by a temporary blob root and an in-memory
/// metadata store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub repo: Arc<InMemoryFileRepository>,
    pub blob_root: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// One multipart `files` part.
pub struct TestFile<'a> {
    pub name: &'a str,
    pub data: Vec<u8>,
    pub content_type: Option<&'a str>,
}

impl<'a> TestFile<'a> {
    pub fn new(name: &'a str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            data: data.into(),
            content_type: None,
        }
    }

    pub fn typed(name: &'a str, data: impl Into<Vec<u8>>, content_type: &'a str) -> Self {
        Self {
            content_type: Some(content_type),
            ..Self::new(name, data)
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(FilesConfig::default()).await
    }

    pub async fn spawn_with(files: FilesConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let blob_root = dir.path().join("uploads");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
            },
            storage: StorageAppConfig {
                root_dir: blob_root.clone(),
                max_blob_size: MAX_BLOB_SIZE,
            },
            files,
        };

        let blobs = FilesystemBlobStore::new(blob_root.clone(), MAX_BLOB_SIZE)
            .await
            .expect("Failed to initialize blob store");
        let repo = Arc::new(InMemoryFileRepository::new());
        let service = FileService::new(Arc::new(blobs), repo.clone(), &app_config.files);

        let state = AppState {
            files: Arc::new(service),
            config: Arc::new(app_config),
        };

        let app = file_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            repo,
            blob_root,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET returning the raw response, for streamed downloads.
    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// POST the files to a slot.
    pub async fn upload(
        &self,
        owner_id: i64,
        category: &str,
        files: Vec<TestFile<'_>>,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(&routes::slot_query(owner_id, category)))
            .multipart(form(files))
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// PUT the files to a slot, replacing its contents.
    pub async fn replace(
        &self,
        owner_id: i64,
        category: &str,
        files: Vec<TestFile<'_>>,
    ) -> TestResponse {
        let res = self
            .client
            .put(self.url(&routes::slot_query(owner_id, category)))
            .multipart(form(files))
            .send()
            .await
            .expect("Failed to send multipart replace request");

        TestResponse::from_response(res).await
    }

    /// Upload one file and return its stored record.
    pub async fn upload_one(
        &self,
        owner_id: i64,
        category: &str,
        name: &str,
        data: &[u8],
    ) -> Value {
        let res = self
            .upload(owner_id, category, vec![TestFile::new(name, data)])
            .await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.body["files"][0].clone()
    }

    /// Blob files currently stored, excluding the staging directory.
    pub fn stored_blobs(&self) -> Vec<PathBuf> {
        list_files(&self.blob_root)
    }
}

fn form(files: Vec<TestFile<'_>>) -> Form {
    files.into_iter().fold(Form::new(), |form, file| {
        let mut part = Part::bytes(file.data).file_name(file.name.to_string());
        if let Some(ct) = file.content_type {
            part = part.mime_str(ct).expect("Failed to set MIME type");
        }
        form.part("files", part)
    })
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("Failed to read blob root")
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .collect()
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i64 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'")
    }
}
