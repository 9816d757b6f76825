//! Person lifecycle error types.

use thiserror::Error;

use registry_core::{PersonDetailsError, PersonId, PhotoError};

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Unexpected failure of the record store or the photo store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Record store failure.
    #[error("record store: {0}")]
    Database(#[from] RepositoryError),

    /// Photo store failure.
    #[error("photo store: {0}")]
    Storage(#[from] StorageError),
}

/// Outcomes other than success for person operations.
#[derive(Debug, Error)]
pub enum PersonError {
    /// A required field is blank. Nothing was written.
    #[error("invalid person: {0}")]
    Validation(#[from] PersonDetailsError),

    /// The photo's extension is not allowed.
    ///
    /// `created` is set when a new record was stored without its photo.
    #[error("unsupported photo: {reason}")]
    UnsupportedMedia {
        /// Why the photo was rejected.
        reason: PhotoError,
        /// Record stored without the photo, if any.
        created: Option<PersonId>,
    },

    /// No record with this id.
    #[error("person {0} not found")]
    NotFound(PersonId),

    /// The operation was rolled back.
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<RepositoryError> for PersonError {
    fn from(e: RepositoryError) -> Self {
        Self::Persistence(e.into())
    }
}

impl From<StorageError> for PersonError {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e.into())
    }
}
