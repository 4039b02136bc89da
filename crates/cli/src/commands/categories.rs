//! Category tree maintenance.
//!
//! Paths are materialized only for the category being written, so renaming
//! or moving a category leaves its descendants' stored chains stale unless
//! `CATEGORY_CASCADE_PATHS` is enabled. This command repairs them.
//!
//! # Usage
//!
//! ```bash
//! bo-cli categories rebuild-paths --dry-run
//! bo-cli categories rebuild-paths
//! ```

use backoffice_admin::config::CategoryConfig;
use backoffice_admin::db::{PgCategoryRepository, create_pool};
use backoffice_admin::services::CategoryService;
use backoffice_admin::services::categories::AncestorPathMaintainer;

use super::{CommandError, admin_database_url};

/// Rewrite every stale materialized path, or only count them with `dry_run`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the database fails.
pub async fn rebuild_paths(dry_run: bool) -> Result<(), CommandError> {
    let database_url = admin_database_url()?;
    let config = CategoryConfig::from_env()?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&database_url).await?;
    let service = CategoryService::new(PgCategoryRepository::new(&pool), config);

    if dry_run {
        let stale = AncestorPathMaintainer::new(service.repository())
            .rebuild_rewrites()
            .await?;
        tracing::info!(stale = stale.len(), "Dry run, no categories rewritten");
        for rewrite in &stale {
            tracing::info!(category_id = %rewrite.id, level = rewrite.level, "Stale path");
        }
        return Ok(());
    }

    let changed = service.rebuild_paths().await?;
    tracing::info!(changed, "Category paths rebuilt");
    Ok(())
}
