//! Collision-free slug resolution.

use std::collections::HashSet;

use tracing::debug;

use backoffice_core::{CategoryId, Slug, SlugError};

use super::CategoryError;
use crate::db::CategoryRepository;

/// Resolves the slug a category will be stored under.
pub struct SlugGenerator<'r, R> {
    repo: &'r R,
}

impl<'r, R: CategoryRepository> SlugGenerator<'r, R> {
    #[must_use]
    pub const fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Derive a slug from `text` that no category other than `exclude` uses.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Validation` if `text` has no letter or digit,
    /// or `CategoryError::Repository` if the taken slugs cannot be loaded.
    pub async fn generate(
        &self,
        text: &str,
        exclude: Option<CategoryId>,
    ) -> Result<Slug, CategoryError> {
        let base = base_slug(text)?;
        let taken = self.repo.taken_slugs(&base, exclude).await?;
        let slug = first_free(&base, &taken);

        if slug != base {
            debug!(base = %base, slug = %slug, "Slug collision resolved with suffix");
        }
        Ok(slug)
    }
}

/// Normalize `text` into a base slug.
///
/// # Errors
///
/// Returns `CategoryError::Validation` if nothing URL-safe is left.
pub fn base_slug(text: &str) -> Result<Slug, CategoryError> {
    Slug::from_text(text).map_err(|e| match e {
        SlugError::Empty => CategoryError::Validation(
            "Category slug must contain at least one letter or digit".to_string(),
        ),
        other => CategoryError::Validation(other.to_string()),
    })
}

/// `base` if free, otherwise `base-1`, `base-2`, ... whichever comes first.
#[must_use]
pub fn first_free(base: &Slug, taken: &HashSet<String>) -> Slug {
    if !taken.contains(base.as_str()) {
        return base.clone();
    }

    let mut n: u32 = 1;
    loop {
        let candidate = base.with_suffix(n);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}
