//! CLI subcommands.

pub mod categories;
pub mod migrate;

use secrecy::SecretString;

/// Errors shared by commands that talk to the admin database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] backoffice_admin::config::ConfigError),

    #[error("Category error: {0}")]
    Category(#[from] backoffice_admin::services::CategoryError),
}

/// Admin database URL, falling back to the generic `DATABASE_URL`.
fn admin_database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("ADMIN_DATABASE_URL"))
}
