//! Person domain type.

use registry_core::{PersonId, PhotoRef};

/// A person record as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Store-assigned id, immutable after insert.
    pub id: PersonId,
    /// Display name (non-empty).
    pub name: String,
    /// Birth date as entered (opaque text, non-empty).
    pub birth_date: String,
    /// Relative path of the attached photo, absent until one is uploaded.
    pub photo: Option<PhotoRef>,
}
