//! Category service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by [`super::CategoryService`].
///
/// Every variant except `Repository` carries a message that is safe to show
/// to an admin user.
#[derive(Debug, Error)]
pub enum CategoryError {
    /// Input failed schema validation.
    #[error("{0}")]
    Validation(String),

    /// The category (or the requested parent) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The requested parent would make the tree cyclic.
    #[error("{0}")]
    InvalidParent(String),

    /// Deleting would orphan subcategories.
    #[error(
        "Cannot delete this category because it contains {count} {}. Please delete or move all subcategories first.",
        subcategory_noun(.count)
    )]
    HasChildren {
        /// Number of direct children.
        count: i64,
    },

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CategoryError {
    pub(crate) fn category_not_found() -> Self {
        Self::NotFound("Category not found".to_string())
    }

    pub(crate) fn parent_not_found() -> Self {
        Self::NotFound("Parent category not found".to_string())
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn subcategory_noun(count: &i64) -> &'static str {
    if *count > 1 { "subcategories" } else { "subcategory" }
}
