//! Photo upload maintenance.
//!
//! Removes photo files left behind by mutations that failed after writing
//! their photo. Run it while the server is idle or stopped; a photo whose
//! transaction has not committed yet would be removed too.

use registry_server::db::PgPersonStore;
use registry_server::services::persons::PersonService;
use registry_server::storage::LocalPhotoStore;

use super::{CommandError, connect};

/// Delete unreferenced photo files from the upload directory.
///
/// # Errors
///
/// Returns an error if the database or the upload directory is unreadable.
pub async fn sweep() -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let photos = LocalPhotoStore::new(config.upload_dir.clone());
    photos.ensure_root().await?;

    let store = PgPersonStore::new(&pool);
    let report = PersonService::new(&store, &photos)
        .sweep_orphaned_photos()
        .await?;

    for name in &report.removed {
        tracing::info!("  removed {name}");
    }
    for name in &report.ignored {
        tracing::warn!("  left unrecognized file {name}");
    }
    tracing::info!(
        "Sweep complete: {} scanned, {} removed, {} ignored",
        report.scanned,
        report.removed.len(),
        report.ignored.len()
    );
    Ok(())
}
