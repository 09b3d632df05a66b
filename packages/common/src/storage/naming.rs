use std::fmt;

use uuid::Uuid;

/// Longest filename (in bytes) accepted by common filesystems.
pub const MAX_FILENAME_LEN: usize = 255;

/// Longest original filename (in bytes) kept in a generated blob name.
///
/// A UUID prefix plus separator adds 37 bytes.
pub const MAX_ORIGINAL_NAME_LEN: usize = 200;

/// Result of validating a flat filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename is longer than [`MAX_FILENAME_LEN`] bytes.
    TooLong,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Invalid filename: longer than 255 bytes",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

impl fmt::Display for FilenameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FilenameError {}

/// Validates a flat filename (no directory components allowed).
///
/// Returns the trimmed name on success.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Stored names end up in Content-Disposition headers.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }

    Ok(trimmed)
}

/// Reduce an uploader-supplied name to something safe to embed in a blob name.
///
/// Replaces control characters with `_` and truncates to
/// [`MAX_ORIGINAL_NAME_LEN`] bytes. [`BlobStore::write`] takes any name hint,
/// so path components and leading dots are stripped here as well, even
/// though callers that run [`validate_flat_filename`] first never pass them.
///
/// [`BlobStore::write`]: super::BlobStore::write
pub fn sanitize_original_name(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut cleaned: String = last
        .trim_start_matches('.')
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if cleaned.len() > MAX_ORIGINAL_NAME_LEN {
        let mut cut = MAX_ORIGINAL_NAME_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Generate a storage-unique blob name: `{uuid-v4}_{sanitized original}`.
pub fn generate_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_original_name(original))
}
