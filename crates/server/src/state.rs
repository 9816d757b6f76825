//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::RegistryConfig;
use crate::db::PgPersonStore;
use crate::services::auth::AuthService;
use crate::storage::LocalPhotoStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RegistryConfig,
    pool: PgPool,
    photos: LocalPhotoStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Photos are stored under `config.upload_dir`.
    #[must_use]
    pub fn new(config: RegistryConfig, pool: PgPool) -> Self {
        let photos = LocalPhotoStore::new(config.upload_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                photos,
            }),
        }
    }

    /// Get a reference to the registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the photo store.
    #[must_use]
    pub fn photos(&self) -> &LocalPhotoStore {
        &self.inner.photos
    }

    /// Record store over the shared pool.
    #[must_use]
    pub fn person_store(&self) -> PgPersonStore<'_> {
        PgPersonStore::new(&self.inner.pool)
    }

    /// Authentication service over the shared pool.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.pool)
    }
}
