//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bo-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Admin migrations: `crates/admin/migrations/`

use backoffice_admin::db::create_pool;

use super::{CommandError, admin_database_url};

/// Run admin database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), CommandError> {
    let database_url = admin_database_url()?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
