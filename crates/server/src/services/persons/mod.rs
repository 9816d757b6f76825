//! Person record lifecycle.
//!
//! Creating, editing, and deleting a person touches two stores that share no
//! transaction: the record store and the photo store. Each mutation runs in
//! one record-store transaction and orders its steps so the id exists before
//! the photo is named after it:
//!
//! 1. write the row (insert or update) and obtain the id
//! 2. write the photo as `{id}.{ext}`
//! 3. store the photo reference on the row
//! 4. commit
//!
//! Any failure rolls the transaction back. A photo written in step 2 stays
//! on disk in that case; [`PersonService::sweep_orphaned_photos`] removes
//! such files later.

mod error;
#[cfg(test)]
mod memory;

use std::collections::HashSet;

use bytes::Bytes;
use tracing::instrument;

use registry_core::{
    PAGE_SIZE, PageNumber, Pagination, PersonDetails, PersonId, PhotoError, PhotoExtension,
    PhotoRef,
};

pub use error::{PersistenceError, PersonError};

use crate::db::{PersonStore, PersonTransaction};
use crate::models::Person;
use crate::storage::PhotoStore;

/// A photo file as received from the client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Client-side filename; only its extension is used.
    pub file_name: String,
    /// File contents.
    pub data: Bytes,
}

/// A photo whose extension passed the allow-list.
struct AcceptedPhoto {
    extension: PhotoExtension,
    data: Bytes,
}

impl PhotoUpload {
    fn accept(self) -> Result<AcceptedPhoto, PhotoError> {
        let extension = PhotoExtension::from_filename(&self.file_name)?;
        Ok(AcceptedPhoto {
            extension,
            data: self.data,
        })
    }
}

/// Raw input for create and edit.
#[derive(Debug, Clone, Default)]
pub struct PersonInput {
    pub name: String,
    pub birth_date: String,
    pub photo: Option<PhotoUpload>,
}

/// One page of the person listing.
#[derive(Debug, Clone)]
pub struct PersonPage {
    pub persons: Vec<Person>,
    pub pagination: Pagination,
}

/// Result of an orphaned-photo sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files examined.
    pub scanned: usize,
    /// Unreferenced photo files that were deleted.
    pub removed: Vec<String>,
    /// Files that do not look like registry photos and were left alone.
    pub ignored: Vec<String>,
}

enum Created {
    Complete(Person),
    WithoutPhoto { person: Person, reason: PhotoError },
}

/// Person record manager.
///
/// Borrowing both stores keeps the service cheap to build per request.
pub struct PersonService<'a> {
    store: &'a dyn PersonStore,
    photos: &'a dyn PhotoStore,
}

impl<'a> PersonService<'a> {
    /// Create a new person service.
    #[must_use]
    pub const fn new(store: &'a dyn PersonStore, photos: &'a dyn PhotoStore) -> Self {
        Self { store, photos }
    }

    /// List one page of records ordered by id.
    ///
    /// A page past the end yields an empty slice, not an error.
    ///
    /// # Errors
    ///
    /// Returns `PersonError::Persistence` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageNumber) -> Result<PersonPage, PersonError> {
        let total_items = self.store.count().await?;
        let pagination = Pagination::new(page, total_items);
        let persons = self
            .store
            .list_page(PAGE_SIZE, page.offset(PAGE_SIZE))
            .await?;

        Ok(PersonPage {
            persons,
            pagination,
        })
    }

    /// Fetch a single record.
    ///
    /// # Errors
    ///
    /// Returns `PersonError::NotFound` if no record has this id.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: PersonId) -> Result<Person, PersonError> {
        self.store
            .get(id)
            .await?
            .ok_or(PersonError::NotFound(id))
    }

    /// Create a record, optionally with a photo.
    ///
    /// Blank fields are rejected before anything is written. A photo with a
    /// disallowed extension does not stop the record itself from being
    /// stored: the row is committed without a photo and the error carries
    /// its id.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name or birth date is blank
    /// - `UnsupportedMedia` with `created: Some(id)` if the photo was refused
    /// - `Persistence` if any store step failed (the row is rolled back)
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: PersonInput) -> Result<Person, PersonError> {
        let details = PersonDetails::parse(&input.name, &input.birth_date)?;
        let photo = input.photo.map(PhotoUpload::accept);

        let mut tx = self.store.begin().await?;
        let result = self.create_in(tx.as_mut(), details, photo).await;

        match settle(tx.as_mut(), result).await? {
            Created::Complete(person) => {
                tracing::info!(person_id = %person.id, has_photo = person.photo.is_some(), "person created");
                Ok(person)
            }
            Created::WithoutPhoto { person, reason } => {
                tracing::info!(person_id = %person.id, %reason, "person created without refused photo");
                Err(PersonError::UnsupportedMedia {
                    reason,
                    created: Some(person.id),
                })
            }
        }
    }

    async fn create_in(
        &self,
        tx: &mut dyn PersonTransaction,
        details: PersonDetails,
        photo: Option<Result<AcceptedPhoto, PhotoError>>,
    ) -> Result<Created, PersonError> {
        let id = tx.insert(&details).await?;
        let (name, birth_date) = details.into_parts();
        let mut person = Person {
            id,
            name,
            birth_date,
            photo: None,
        };

        match photo {
            None => Ok(Created::Complete(person)),
            Some(Err(reason)) => Ok(Created::WithoutPhoto { person, reason }),
            Some(Ok(accepted)) => {
                person.photo = Some(self.attach_photo(tx, id, accepted).await?);
                Ok(Created::Complete(person))
            }
        }
    }

    /// Update a record's fields and optionally replace its photo.
    ///
    /// The record must exist, and both the fields and the photo extension
    /// are checked before any write. A new photo overwrites the file of the
    /// same derived name; if the extension changed, the previous file is
    /// removed after commit.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this id
    /// - `Validation` if the name or birth date is blank
    /// - `UnsupportedMedia` with `created: None` if the photo was refused
    /// - `Persistence` if any store step failed (the update is rolled back)
    #[instrument(skip(self, input))]
    pub async fn edit(&self, id: PersonId, input: PersonInput) -> Result<Person, PersonError> {
        let mut tx = self.store.begin().await?;
        let result = self.edit_in(tx.as_mut(), id, input).await;
        let (person, previous_photo) = settle(tx.as_mut(), result).await?;

        if let Some(previous) = previous_photo
            && person.photo.as_ref() != Some(&previous)
        {
            self.discard_photo(&previous).await;
        }

        tracing::info!(person_id = %id, has_photo = person.photo.is_some(), "person updated");
        Ok(person)
    }

    async fn edit_in(
        &self,
        tx: &mut dyn PersonTransaction,
        id: PersonId,
        input: PersonInput,
    ) -> Result<(Person, Option<PhotoRef>), PersonError> {
        let current = tx.find(id).await?.ok_or(PersonError::NotFound(id))?;
        let details = PersonDetails::parse(&input.name, &input.birth_date)?;
        let photo = input
            .photo
            .map(PhotoUpload::accept)
            .transpose()
            .map_err(|reason| PersonError::UnsupportedMedia {
                reason,
                created: None,
            })?;

        if !tx.update_details(id, &details).await? {
            return Err(PersonError::NotFound(id));
        }

        let photo_ref = match photo {
            Some(accepted) => Some(self.attach_photo(tx, id, accepted).await?),
            None => current.photo.clone(),
        };

        let (name, birth_date) = details.into_parts();
        let person = Person {
            id,
            name,
            birth_date,
            photo: photo_ref,
        };

        Ok((person, current.photo))
    }

    /// Delete a record and its photo file.
    ///
    /// A photo file that is already gone is not an error. The file is
    /// removed before the row; if the row delete then fails, the file stays
    /// removed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this id
    /// - `Persistence` if any store step failed (the row delete is rolled back)
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PersonId) -> Result<Person, PersonError> {
        let mut tx = self.store.begin().await?;
        let result = self.delete_in(tx.as_mut(), id).await;
        let person = settle(tx.as_mut(), result).await?;

        tracing::info!(person_id = %id, "person deleted");
        Ok(person)
    }

    async fn delete_in(
        &self,
        tx: &mut dyn PersonTransaction,
        id: PersonId,
    ) -> Result<Person, PersonError> {
        let person = tx.find(id).await?.ok_or(PersonError::NotFound(id))?;

        if let Some(photo) = &person.photo {
            let name = photo.blob_name();
            if self.photos.exists(&name).await? {
                self.photos.delete(&name).await?;
            } else {
                tracing::warn!(person_id = %id, photo = %photo, "photo file already missing");
            }
        }

        if !tx.delete(id).await? {
            return Err(PersonError::NotFound(id));
        }

        Ok(person)
    }

    /// Delete photo files that no record references.
    ///
    /// These are left behind when a mutation fails after writing its photo.
    /// Files whose names the registry would never produce are reported but
    /// kept. Run this while no mutation is in flight: a photo written by a
    /// transaction that has not committed yet looks unreferenced.
    ///
    /// # Errors
    ///
    /// Returns `PersonError::Persistence` if either store fails.
    #[instrument(skip(self))]
    pub async fn sweep_orphaned_photos(&self) -> Result<SweepReport, PersonError> {
        let referenced: HashSet<String> = self
            .store
            .photo_refs()
            .await?
            .iter()
            .map(PhotoRef::blob_name)
            .collect();

        let mut report = SweepReport::default();
        for name in self.photos.list().await? {
            report.scanned += 1;
            if referenced.contains(&name) {
                continue;
            }
            if PhotoRef::from_blob_name(&name).is_none() {
                report.ignored.push(name);
                continue;
            }
            self.photos.delete(&name).await?;
            tracing::info!(photo = %name, "removed orphaned photo");
            report.removed.push(name);
        }

        Ok(report)
    }

    async fn attach_photo(
        &self,
        tx: &mut dyn PersonTransaction,
        id: PersonId,
        accepted: AcceptedPhoto,
    ) -> Result<PhotoRef, PersonError> {
        let photo_ref = PhotoRef::for_person(id, accepted.extension);
        self.photos
            .put(&photo_ref.blob_name(), accepted.data)
            .await?;
        tx.set_photo(id, &photo_ref).await?;
        Ok(photo_ref)
    }

    /// Best-effort removal of a photo no longer referenced after commit.
    async fn discard_photo(&self, photo: &PhotoRef) {
        if let Err(e) = self.photos.delete(&photo.blob_name()).await {
            tracing::warn!(photo = %photo, error = %e, "failed to remove replaced photo");
        }
    }
}

/// Commit on success, roll back on failure.
async fn settle<T>(
    tx: &mut dyn PersonTransaction,
    result: Result<T, PersonError>,
) -> Result<T, PersonError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::warn!(error = %rollback_error, "rollback failed");
            }
            Err(e)
        }
    }
}
