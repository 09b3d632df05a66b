use std::sync::Arc;

use common::FileCategory;
use common::storage::naming::validate_flat_filename;
use common::storage::{BlobStore, StorageError, StoredBlob};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::duplicate::DuplicatePolicy;
use super::error::{FileError, Result};
use super::slots::{SlotGuard, SlotLocks};
use super::upload::{LoadedFile, UploadItem};
use crate::config::FilesConfig;
use crate::models::file::{DEFAULT_CONTENT_TYPE, FileRecord, NewFileRecord};
use crate::repository::FileRepository;

/// Keeps blobs and their metadata records in agreement.
///
/// A record is inserted only after its bytes are fully written, and bytes are
/// removed again when the record cannot be committed. Deletes remove the blob
/// before the record.
pub struct FileService {
    blobs: Arc<dyn BlobStore>,
    repo: Arc<dyn FileRepository>,
    duplicates: DuplicatePolicy,
    slots: Option<SlotLocks>,
    max_concurrent: usize,
}

impl FileService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        repo: Arc<dyn FileRepository>,
        config: &FilesConfig,
    ) -> Self {
        Self {
            blobs,
            repo,
            duplicates: DuplicatePolicy::new(config.duplicate_check),
            slots: config.lock_slots.then(SlotLocks::new),
            max_concurrent: config.max_concurrent_uploads.max(1),
        }
    }

    async fn lock_slot(&self, owner_id: i64, category: FileCategory) -> Option<SlotGuard> {
        match &self.slots {
            Some(slots) => Some(slots.acquire(owner_id, category).await),
            None => None,
        }
    }

    /// Store every item under the slot.
    ///
    /// All items are attempted. Returns the committed records, or the first
    /// failure in input order; items that committed before or alongside a
    /// failed sibling stay stored.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn store(
        &self,
        owner_id: i64,
        category: FileCategory,
        items: Vec<UploadItem>,
    ) -> Result<Vec<FileRecord>> {
        let results = self.store_settled(owner_id, category, items).await;
        first_failure(results)
    }

    /// Store every item under the slot, reporting one outcome per item in input order.
    pub async fn store_settled(
        &self,
        owner_id: i64,
        category: FileCategory,
        items: Vec<UploadItem>,
    ) -> Vec<Result<FileRecord>> {
        let _guard = self.lock_slot(owner_id, category).await;
        self.store_unlocked(owner_id, category, items).await
    }

    /// Replace the slot's files with `items`.
    ///
    /// Failures while clearing the slot are logged and do not stop the store.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn update(
        &self,
        owner_id: i64,
        category: FileCategory,
        items: Vec<UploadItem>,
    ) -> Result<Vec<FileRecord>> {
        let _guard = self.lock_slot(owner_id, category).await;

        if let Err(e) = self.delete_slot_unlocked(owner_id, category).await {
            warn!(error = %e, "Clearing slot before replace failed, storing anyway");
        }

        let results = self.store_unlocked(owner_id, category, items).await;
        first_failure(results)
    }

    /// Open a stored blob by name, without consulting metadata.
    #[instrument(skip(self))]
    pub async fn load_as_stream(&self, filename: &str) -> Result<LoadedFile> {
        let reader = self.blobs.read(filename).await.map_err(|e| match e {
            // Names that could never be stored read as absent.
            StorageError::InvalidName(_) => {
                FileError::NotFound(format!("File not found: {filename}"))
            }
            other => FileError::from(other),
        })?;
        let size = self.blobs.size(filename).await.ok();

        Ok(LoadedFile {
            filename: filename.trim().to_string(),
            size,
            reader,
        })
    }

    pub async fn get_by_owner_and_category(
        &self,
        owner_id: i64,
        category: FileCategory,
    ) -> Result<Vec<FileRecord>> {
        Ok(self
            .repo
            .find_by_owner_and_category(owner_id, category)
            .await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<FileRecord> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| FileError::NotFound(format!("File not found with ID: {id}")))
    }

    /// Delete a file's bytes, then its record.
    #[instrument(skip(self))]
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let record = self
            .repo
            .find_by_filename(filename)
            .await?
            .ok_or_else(|| FileError::NotFound(format!("File not found: {filename}")))?;

        self.blobs.delete(&record.filename).await.map_err(|e| {
            FileError::StorageFailure(format!("Failed to delete file {}: {e}", record.filename))
        })?;
        self.repo.delete_by_filename(&record.filename).await?;

        info!(filename = %record.filename, "File deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        let record = self.get_by_id(id).await?;
        self.delete(&record.filename).await
    }

    /// Delete every file of the slot, continuing past individual failures.
    #[instrument(skip(self))]
    pub async fn delete_by_owner_and_category(
        &self,
        owner_id: i64,
        category: FileCategory,
    ) -> Result<()> {
        let _guard = self.lock_slot(owner_id, category).await;
        self.delete_slot_unlocked(owner_id, category).await
    }

    async fn delete_slot_unlocked(&self, owner_id: i64, category: FileCategory) -> Result<()> {
        let records = self
            .repo
            .find_by_owner_and_category(owner_id, category)
            .await?;
        let total = records.len();
        let mut failed = Vec::new();

        for record in records {
            match self.delete(&record.filename).await {
                Ok(()) => {}
                // Removed concurrently; the slot no longer holds it.
                Err(FileError::NotFound(_)) => {}
                Err(e) => {
                    warn!(filename = %record.filename, error = %e, "Failed to delete file");
                    failed.push(record.filename);
                }
            }
        }

        if !failed.is_empty() {
            return Err(FileError::StorageFailure(format!(
                "Failed to delete {} of {total} files for owner {owner_id} ({category}): {}",
                failed.len(),
                failed.join(", ")
            )));
        }

        info!(owner_id, category = %category, deleted = total, "All files deleted for slot");
        Ok(())
    }

    async fn store_unlocked(
        &self,
        owner_id: i64,
        category: FileCategory,
        items: Vec<UploadItem>,
    ) -> Vec<Result<FileRecord>> {
        let mut batch = self.duplicates.batch();
        let prepared: Vec<Result<UploadItem>> = items
            .into_iter()
            .map(|item| {
                if owner_id <= 0 {
                    return Err(FileError::Invalid(format!(
                        "Owner ID must be positive, got {owner_id}"
                    )));
                }
                let name = validate_flat_filename(&item.original_filename)
                    .map_err(|e| FileError::Invalid(e.message().into()))?
                    .to_string();
                batch.claim(owner_id, &name)?;
                Ok(UploadItem {
                    original_filename: name,
                    ..item
                })
            })
            .collect();

        stream::iter(prepared)
            .map(|prepared| async move {
                match prepared {
                    Ok(item) => self.store_one(owner_id, category, item).await,
                    Err(e) => Err(e),
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    async fn store_one(
        &self,
        owner_id: i64,
        category: FileCategory,
        item: UploadItem,
    ) -> Result<FileRecord> {
        let UploadItem {
            original_filename,
            content_type,
            reader,
        } = item;

        let blob = self
            .blobs
            .write(&original_filename, reader)
            .await
            .map_err(|e| write_error(&original_filename, e))?;

        let candidate =
            candidate_record(owner_id, category, original_filename, content_type, &blob);

        match self.commit(candidate).await {
            Ok(record) => {
                info!(
                    id = record.id,
                    filename = %record.filename,
                    size = record.size,
                    "File stored"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard_blob(&blob.name).await;
                Err(e)
            }
        }
    }

    /// Validate and insert a candidate whose bytes are already on disk.
    async fn commit(&self, candidate: NewFileRecord) -> Result<FileRecord> {
        if candidate.size <= 0 {
            return Err(FileError::Invalid(format!(
                "File '{}' is empty",
                candidate.original_filename
            )));
        }

        self.duplicates
            .check_existing(&*self.repo, candidate.owner_id, &candidate.original_filename)
            .await?;

        Ok(self.repo.insert(candidate).await?)
    }

    /// Best-effort removal of a blob whose record was not committed.
    async fn discard_blob(&self, name: &str) {
        match self.blobs.delete(name).await {
            Ok(_) => debug!(name, "Discarded uncommitted blob"),
            Err(e) => warn!(name, error = %e, "Failed to delete blob after failed store"),
        }
    }
}

fn candidate_record(
    owner_id: i64,
    category: FileCategory,
    original_filename: String,
    content_type: Option<String>,
    blob: &StoredBlob,
) -> NewFileRecord {
    let content_type = content_type
        .map(|ct| ct.trim().to_string())
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    NewFileRecord {
        owner_id,
        filename: blob.name.clone(),
        original_filename,
        content_type,
        file_path: blob.path.to_string_lossy().into_owned(),
        size: i64::try_from(blob.size).unwrap_or(i64::MAX),
        category,
    }
}

fn write_error(original_filename: &str, err: StorageError) -> FileError {
    match err {
        StorageError::SizeLimitExceeded { .. } => {
            FileError::Invalid(format!("File '{original_filename}' rejected: {err}"))
        }
        other => FileError::StorageFailure(format!(
            "Failed to store file '{original_filename}': {other}"
        )),
    }
}

fn first_failure(results: Vec<Result<FileRecord>>) -> Result<Vec<FileRecord>> {
    let mut records = Vec::with_capacity(results.len());
    let mut failure = None;

    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) if failure.is_none() => failure = Some(e),
            Err(_) => {}
        }
    }

    match failure {
        Some(e) => {
            if !records.is_empty() {
                warn!(
                    committed = records.len(),
                    error = %e,
                    "Upload partially failed; committed files were kept"
                );
            }
            Err(e)
        }
        None => Ok(records),
    }
}
