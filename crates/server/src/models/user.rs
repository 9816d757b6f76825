//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use registry_core::UserId;

/// An account allowed to create, edit, and delete records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
}
