use std::collections::HashSet;

use super::error::{FileError, Result};
use crate::repository::FileRepository;

/// Rejects uploads whose original filename the owner already has.
///
/// Names are compared exactly, across all categories of the owner.
#[derive(Debug, Clone, Copy)]
pub struct DuplicatePolicy {
    enabled: bool,
}

impl DuplicatePolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Fail with [`FileError::DuplicateFile`] if a record already uses the name.
    pub async fn check_existing(
        &self,
        repo: &dyn FileRepository,
        owner_id: i64,
        original_filename: &str,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if repo
            .exists_by_owner_and_original_filename(owner_id, original_filename)
            .await?
        {
            return Err(FileError::DuplicateFile {
                owner_id,
                original_filename: original_filename.to_string(),
            });
        }

        Ok(())
    }

    /// Tracker for names repeated within a single batch.
    pub fn batch(&self) -> BatchNames {
        BatchNames {
            enabled: self.enabled,
            seen: HashSet::new(),
        }
    }
}

/// Names already claimed by earlier items of the same batch.
pub struct BatchNames {
    enabled: bool,
    seen: HashSet<String>,
}

impl BatchNames {
    /// Claim a name for an item; fails if an earlier item claimed it.
    pub fn claim(&mut self, owner_id: i64, original_filename: &str) -> Result<()> {
        if self.enabled && !self.seen.insert(original_filename.to_string()) {
            return Err(FileError::DuplicateFile {
                owner_id,
                original_filename: original_filename.to_string(),
            });
        }
        Ok(())
    }
}
