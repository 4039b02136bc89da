//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::PgCategoryRepository;
use crate::services::categories::CategoryService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Services borrow the pool and are built per
/// request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Category service backed by `PostgreSQL`.
    #[must_use]
    pub fn categories(&self) -> CategoryService<PgCategoryRepository<'_>> {
        CategoryService::new(
            PgCategoryRepository::new(&self.inner.pool),
            *self.inner.config.categories(),
        )
    }
}
