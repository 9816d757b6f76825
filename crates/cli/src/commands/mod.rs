//! CLI command implementations.

pub mod migrate;
pub mod uploads;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use registry_server::config::{ConfigError, RegistryConfig};
use registry_server::db;
use registry_server::services::auth::AuthError;
use registry_server::services::persons::PersonError;
use registry_server::storage::StorageError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account could not be created.
    #[error("Account error: {0}")]
    Auth(#[from] AuthError),

    /// Photo sweep failed.
    #[error("Sweep error: {0}")]
    Person(#[from] PersonError),

    /// Upload directory could not be prepared.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading stdin failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the server configuration and connect to its database.
async fn connect() -> Result<(RegistryConfig, PgPool), CommandError> {
    let config = RegistryConfig::from_env()?;

    tracing::info!("Connecting to registry database...");
    let pool = db::create_pool(&config.database_url).await?;

    Ok((config, pool))
}
