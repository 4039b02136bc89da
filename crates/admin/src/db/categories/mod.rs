//! Category persistence boundary.
//!
//! [`CategoryRepository`] is the only way the service layer touches stored
//! categories. Two implementations ship with the crate:
//!
//! - [`PgCategoryRepository`] - `admin.categories` in `PostgreSQL`
//! - [`InMemoryCategoryRepository`] - process-local store for tests and tooling
//!
//! Both enforce the storage-level guarantees the service relies on: slugs are
//! unique ([`RepositoryError::DuplicateSlug`]) and a category that still has
//! children cannot be deleted ([`RepositoryError::Conflict`]).

mod memory;
mod postgres;

use std::collections::HashSet;
use std::future::Future;

use backoffice_core::{AncestorRef, Category, CategoryId, Slug};

use super::RepositoryError;
use crate::models::category::{CategoryFilter, CategoryQuery};

pub use memory::InMemoryCategoryRepository;
pub use postgres::PgCategoryRepository;

/// Every persisted, caller-controlled column of a category.
///
/// `id` and the timestamps are owned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub image: String,
    pub parent_id: Option<CategoryId>,
    pub ancestors: Vec<AncestorRef>,
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub meta_title: String,
    pub meta_description: String,
}

impl From<&Category> for CategoryRecord {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
            parent_id: category.parent_id,
            ancestors: category.ancestors.clone(),
            level: category.level,
            sort_order: category.sort_order,
            is_active: category.is_active,
            meta_title: category.meta_title.clone(),
            meta_description: category.meta_description.clone(),
        }
    }
}

/// A replacement materialized path for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub id: CategoryId,
    pub ancestors: Vec<AncestorRef>,
    pub level: i32,
}

/// Storage operations for the category tree.
pub trait CategoryRepository: Send + Sync {
    /// Fetch one category.
    fn find_by_id(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Direct children of `parent_id` (roots when `None`), ordered by
    /// `sort_order`, then `name`, then `id`.
    fn find_by_parent(
        &self,
        parent_id: Option<CategoryId>,
    ) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Number of direct children of `id`.
    fn count_children(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// Slugs equal to `base` or shaped `base-<suffix>`, ignoring `exclude`.
    fn taken_slugs(
        &self,
        base: &Slug,
        exclude: Option<CategoryId>,
    ) -> impl Future<Output = Result<HashSet<String>, RepositoryError>> + Send;

    /// One page of categories matching `query`.
    fn list(
        &self,
        query: &CategoryQuery,
    ) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Total number of categories matching `filter`.
    fn count(
        &self,
        filter: &CategoryFilter,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// Insert a category and return it with its assigned id and timestamps.
    fn create(
        &self,
        record: &CategoryRecord,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// Replace every caller-controlled column of `id` and apply
    /// `descendant_paths` in the same transaction.
    ///
    /// Either everything is written or nothing is. Returns
    /// `RepositoryError::NotFound` if `id` does not exist.
    fn update(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
        descendant_paths: &[PathRewrite],
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// Apply a batch of path rewrites atomically; returns rows changed.
    fn rewrite_paths(
        &self,
        rewrites: &[PathRewrite],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete `id`; returns `false` if it did not exist.
    fn delete(&self, id: CategoryId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}
