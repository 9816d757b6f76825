//! Photo blob storage.
//!
//! Uploaded photos live outside the database, addressed by a flat file name
//! derived from the owning record (`{id}.{ext}`). The store offers no
//! transactions: a write is visible immediately and a later database
//! rollback does not undo it.

mod local;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use local::LocalPhotoStore;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The name is not a single, plain path segment.
    #[error("invalid blob name: {0:?}")]
    InvalidName(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend for photo files.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Write a file, replacing any existing file of the same name.
    async fn put(&self, name: &str, data: Bytes) -> StorageResult<()>;

    /// Check if a file exists.
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Remove a file. Removing a missing file succeeds.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Names of every stored file.
    async fn list(&self) -> StorageResult<Vec<String>>;
}

/// Reject names that could escape the storage directory.
pub(crate) fn validate_name(name: &str) -> StorageResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StorageError::InvalidName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("12.png").is_ok());
        for bad in ["", ".", "..", "../12.png", "a/b.png", "a\\b.png"] {
            assert!(
                matches!(validate_name(bad), Err(StorageError::InvalidName(_))),
                "{bad:?}"
            );
        }
    }
}
