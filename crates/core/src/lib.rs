//! Registry Core - Shared domain types.
//!
//! This crate provides the types shared by the registry components:
//! - `server` - Web application serving the person records
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access, no filesystem. This keeps the record rules testable in
//! isolation and usable from every binary.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, person details, photo references, pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
