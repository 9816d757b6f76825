//! Domain models for the registry server.

pub mod person;
pub mod session;
pub mod user;

pub use person::Person;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
