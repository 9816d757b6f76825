//! Core types for the registry.
//!
//! This module provides type-safe wrappers for the record domain.

pub mod id;
pub mod page;
pub mod person;
pub mod photo;

pub use id::*;
pub use page::{PAGE_SIZE, PageNumber, Pagination, total_pages};
pub use person::{PersonDetails, PersonDetailsError};
pub use photo::{PhotoError, PhotoExtension, PhotoRef, UPLOADS_PREFIX};
