//! Person record store.
//!
//! [`PersonStore`] is the seam between the record lifecycle and the
//! relational backend. Mutations go through a [`PersonTransaction`]; a
//! transaction that is dropped without `commit` is rolled back and its
//! connection returned to the pool.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use registry_core::{PersonDetails, PersonId, PhotoRef};

use super::RepositoryError;
use crate::models::person::Person;

/// Read access and transaction entry point for person records.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Total number of records.
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// A slice of records ordered by ascending id.
    async fn list_page(&self, limit: u32, offset: u64) -> Result<Vec<Person>, RepositoryError>;

    /// A single record, if it exists.
    async fn get(&self, id: PersonId) -> Result<Option<Person>, RepositoryError>;

    /// Every photo reference currently stored.
    async fn photo_refs(&self) -> Result<Vec<PhotoRef>, RepositoryError>;

    /// Start a transaction for a multi-step mutation.
    async fn begin(&self) -> Result<Box<dyn PersonTransaction>, RepositoryError>;
}

/// Writes against person records inside one transaction.
#[async_trait]
pub trait PersonTransaction: Send {
    /// Read a record and lock it for the rest of the transaction.
    async fn find(&mut self, id: PersonId) -> Result<Option<Person>, RepositoryError>;

    /// Insert a record without a photo and return its generated id.
    async fn insert(&mut self, details: &PersonDetails) -> Result<PersonId, RepositoryError>;

    /// Overwrite name and birth date. Returns `false` if the row is missing.
    async fn update_details(
        &mut self,
        id: PersonId,
        details: &PersonDetails,
    ) -> Result<bool, RepositoryError>;

    /// Record the photo reference for an existing row.
    async fn set_photo(&mut self, id: PersonId, photo: &PhotoRef) -> Result<(), RepositoryError>;

    /// Delete a row. Returns `false` if it did not exist.
    async fn delete(&mut self, id: PersonId) -> Result<bool, RepositoryError>;

    /// Make every write of this transaction durable.
    async fn commit(&mut self) -> Result<(), RepositoryError>;

    /// Discard every write of this transaction.
    async fn rollback(&mut self) -> Result<(), RepositoryError>;
}

/// Raw `registry.person` row.
#[derive(Debug, sqlx::FromRow)]
struct PersonRow {
    id: PersonId,
    name: String,
    birth_date: String,
    photo: Option<String>,
}

impl TryFrom<PersonRow> for Person {
    type Error = RepositoryError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let photo = row
            .photo
            .as_deref()
            .map(PhotoRef::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("person {}: {e}", row.id))
            })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            birth_date: row.birth_date,
            photo,
        })
    }
}

/// `PostgreSQL` implementation of [`PersonStore`].
pub struct PgPersonStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgPersonStore<'a> {
    /// Create a new person store over a pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStore for PgPersonStore<'_> {
    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registry.person")
            .fetch_one(self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative row count {count}")))
    }

    async fn list_page(&self, limit: u32, offset: u64) -> Result<Vec<Person>, RepositoryError> {
        // Offsets past i64::MAX cannot match any row.
        let Ok(offset) = i64::try_from(offset) else {
            return Ok(Vec::new());
        };

        let rows: Vec<PersonRow> = sqlx::query_as(
            r"
            SELECT id, name, birth_date, photo
            FROM registry.person
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Person::try_from).collect()
    }

    async fn get(&self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        let row: Option<PersonRow> = sqlx::query_as(
            r"
            SELECT id, name, birth_date, photo
            FROM registry.person
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Person::try_from).transpose()
    }

    async fn photo_refs(&self) -> Result<Vec<PhotoRef>, RepositoryError> {
        let values: Vec<String> =
            sqlx::query_scalar("SELECT photo FROM registry.person WHERE photo IS NOT NULL")
                .fetch_all(self.pool)
                .await?;

        values
            .iter()
            .map(|value| {
                PhotoRef::parse(value).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
            })
            .collect()
    }

    async fn begin(&self) -> Result<Box<dyn PersonTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPersonTransaction { tx: Some(tx) }))
    }
}

/// An open `PostgreSQL` transaction over `registry.person`.
struct PgPersonTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgPersonTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, RepositoryError> {
        self.tx
            .as_mut()
            .map(|tx| &mut **tx)
            .ok_or(RepositoryError::TransactionFinished)
    }
}

#[async_trait]
impl PersonTransaction for PgPersonTransaction {
    async fn find(&mut self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        let row: Option<PersonRow> = sqlx::query_as(
            r"
            SELECT id, name, birth_date, photo
            FROM registry.person
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        row.map(Person::try_from).transpose()
    }

    async fn insert(&mut self, details: &PersonDetails) -> Result<PersonId, RepositoryError> {
        let id: PersonId = sqlx::query_scalar(
            r"
            INSERT INTO registry.person (name, birth_date)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(details.name())
        .bind(details.birth_date())
        .fetch_one(self.conn()?)
        .await?;

        Ok(id)
    }

    async fn update_details(
        &mut self,
        id: PersonId,
        details: &PersonDetails,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE registry.person
            SET name = $1, birth_date = $2
            WHERE id = $3
            ",
        )
        .bind(details.name())
        .bind(details.birth_date())
        .bind(id)
        .execute(self.conn()?)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_photo(&mut self, id: PersonId, photo: &PhotoRef) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE registry.person
            SET photo = $1
            WHERE id = $2
            ",
        )
        .bind(photo.to_string())
        .bind(id)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&mut self, id: PersonId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM registry.person WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let tx = self.tx.take().ok_or(RepositoryError::TransactionFinished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        let tx = self.tx.take().ok_or(RepositoryError::TransactionFinished)?;
        tx.rollback().await?;
        Ok(())
    }
}
