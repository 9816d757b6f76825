//! In-memory stores for lifecycle tests.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use registry_core::{PersonDetails, PersonId, PhotoRef};

use crate::db::{PersonStore, PersonTransaction, RepositoryError};
use crate::models::Person;
use crate::storage::{PhotoStore, StorageError, StorageResult};

fn injected() -> RepositoryError {
    RepositoryError::DataCorruption("injected failure".to_owned())
}

#[derive(Default)]
struct RecordState {
    rows: BTreeMap<PersonId, Person>,
    last_id: i32,
    fail_set_photo: bool,
    fail_delete: bool,
    commits: usize,
    rollbacks: usize,
}

/// Record store keeping rows in a map; ids come from a sequence that never
/// rewinds, even on rollback.
#[derive(Clone, Default)]
pub struct MemoryPersonStore {
    state: Arc<Mutex<RecordState>>,
}

impl MemoryPersonStore {
    fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap()
    }

    /// Insert a committed row directly.
    pub fn seed(&self, name: &str, birth_date: &str) -> PersonId {
        let mut state = self.lock();
        state.last_id += 1;
        let id = PersonId::new(state.last_id);
        state.rows.insert(
            id,
            Person {
                id,
                name: name.to_owned(),
                birth_date: birth_date.to_owned(),
                photo: None,
            },
        );
        id
    }

    /// Set a committed row's photo reference directly.
    pub fn seed_photo(&self, id: PersonId, photo: PhotoRef) {
        self.lock().rows.get_mut(&id).unwrap().photo = Some(photo);
    }

    pub fn row(&self, id: PersonId) -> Option<Person> {
        self.lock().rows.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn fail_set_photo(&self) {
        self.lock().fail_set_photo = true;
    }

    pub fn fail_delete(&self) {
        self.lock().fail_delete = true;
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.lock().rows.len() as u64)
    }

    async fn list_page(&self, limit: u32, offset: u64) -> Result<Vec<Person>, RepositoryError> {
        let state = self.lock();
        Ok(state
            .rows
            .values()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    async fn photo_refs(&self) -> Result<Vec<PhotoRef>, RepositoryError> {
        Ok(self
            .lock()
            .rows
            .values()
            .filter_map(|person| person.photo.clone())
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn PersonTransaction>, RepositoryError> {
        let staged = self.lock().rows.clone();
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            staged,
            finished: false,
        }))
    }
}

/// Works on a copy of the rows; `commit` publishes the copy.
struct MemoryTransaction {
    store: MemoryPersonStore,
    staged: BTreeMap<PersonId, Person>,
    finished: bool,
}

impl MemoryTransaction {
    fn check_open(&self) -> Result<(), RepositoryError> {
        if self.finished {
            return Err(RepositoryError::TransactionFinished);
        }
        Ok(())
    }
}

#[async_trait]
impl PersonTransaction for MemoryTransaction {
    async fn find(&mut self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        self.check_open()?;
        Ok(self.staged.get(&id).cloned())
    }

    async fn insert(&mut self, details: &PersonDetails) -> Result<PersonId, RepositoryError> {
        self.check_open()?;
        let id = {
            let mut state = self.store.lock();
            state.last_id += 1;
            PersonId::new(state.last_id)
        };
        self.staged.insert(
            id,
            Person {
                id,
                name: details.name().to_owned(),
                birth_date: details.birth_date().to_owned(),
                photo: None,
            },
        );
        Ok(id)
    }

    async fn update_details(
        &mut self,
        id: PersonId,
        details: &PersonDetails,
    ) -> Result<bool, RepositoryError> {
        self.check_open()?;
        Ok(self.staged.get_mut(&id).is_some_and(|person| {
            person.name = details.name().to_owned();
            person.birth_date = details.birth_date().to_owned();
            true
        }))
    }

    async fn set_photo(&mut self, id: PersonId, photo: &PhotoRef) -> Result<(), RepositoryError> {
        self.check_open()?;
        if self.store.lock().fail_set_photo {
            return Err(injected());
        }
        let person = self.staged.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        person.photo = Some(photo.clone());
        Ok(())
    }

    async fn delete(&mut self, id: PersonId) -> Result<bool, RepositoryError> {
        self.check_open()?;
        if self.store.lock().fail_delete {
            return Err(injected());
        }
        Ok(self.staged.remove(&id).is_some())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        self.check_open()?;
        self.finished = true;
        let mut state = self.store.lock();
        state.rows = std::mem::take(&mut self.staged);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        self.check_open()?;
        self.finished = true;
        self.store.lock().rollbacks += 1;
        Ok(())
    }
}

#[derive(Default)]
struct BlobState {
    files: BTreeMap<String, Bytes>,
    fail_put: bool,
    calls: usize,
}

/// Photo store keeping files in a map and counting every call.
#[derive(Clone, Default)]
pub struct MemoryPhotoStore {
    state: Arc<Mutex<BlobState>>,
}

impl MemoryPhotoStore {
    fn lock(&self) -> MutexGuard<'_, BlobState> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state
    }

    pub fn file(&self, name: &str) -> Option<Bytes> {
        self.state.lock().unwrap().files.get(name).cloned()
    }

    pub fn insert(&self, name: &str, data: &'static [u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(name.to_owned(), Bytes::from_static(data));
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn fail_put(&self) {
        self.state.lock().unwrap().fail_put = true;
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn put(&self, name: &str, data: Bytes) -> StorageResult<()> {
        let mut state = self.lock();
        if state.fail_put {
            return Err(StorageError::Io(std::io::Error::other("injected failure")));
        }
        state.files.insert(name.to_owned(), data);
        Ok(())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.lock().files.contains_key(name))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        self.lock().files.remove(name);
        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock().files.keys().cloned().collect())
    }
}
