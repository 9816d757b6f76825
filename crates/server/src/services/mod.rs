//! Business logic services for the registry.
//!
//! # Services
//!
//! - `auth` - Operator accounts and password login
//! - `persons` - Person record lifecycle (list, create, detail, edit, delete)

pub mod auth;
pub mod persons;
