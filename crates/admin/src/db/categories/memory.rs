//! Process-local category repository.
//!
//! Mirrors the `PostgreSQL` schema's guarantees (unique slugs, parent foreign
//! key with `ON DELETE RESTRICT`) so service behaviour is identical on both
//! backends.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use backoffice_core::{Category, CategoryId, Slug};

use super::{CategoryRecord, CategoryRepository, PathRewrite};
use crate::db::RepositoryError;
use crate::models::category::{CategoryFilter, CategoryQuery, SortDirection, SortField};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i32,
    rows: BTreeMap<CategoryId, Category>,
}

impl MemoryState {
    fn check_slug_free(&self, slug: &Slug, owner: Option<CategoryId>) -> Result<(), RepositoryError> {
        let taken = self
            .rows
            .values()
            .any(|c| c.slug == *slug && Some(c.id) != owner);
        if taken {
            return Err(RepositoryError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }

    /// Rows missing from the store are skipped.
    fn apply_rewrites(&mut self, rewrites: &[PathRewrite], now: DateTime<Utc>) -> u64 {
        let mut changed = 0;
        for rewrite in rewrites {
            if let Some(category) = self.rows.get_mut(&rewrite.id) {
                category.ancestors.clone_from(&rewrite.ancestors);
                category.level = rewrite.level;
                category.updated_at = now;
                changed += 1;
            }
        }
        changed
    }

    fn check_parent_exists(&self, parent_id: Option<CategoryId>) -> Result<(), RepositoryError> {
        match parent_id {
            Some(id) if !self.rows.contains_key(&id) => Err(RepositoryError::Conflict(
                "parent category no longer exists".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// In-memory [`CategoryRepository`].
#[derive(Debug, Default)]
pub struct InMemoryCategoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryCategoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the store lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.state()?.rows.values().cloned().collect())
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::DataCorruption("category store lock poisoned".to_string()))
    }
}

fn compare(a: &Category, b: &Category, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Slug => a.slug.cmp(&b.slug),
        SortField::Level => a.level.cmp(&b.level),
        SortField::SortOrder => a.sort_order.cmp(&b.sort_order),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn apply_record(category: &mut Category, record: &CategoryRecord) {
    category.name.clone_from(&record.name);
    category.slug = record.slug.clone();
    category.description.clone_from(&record.description);
    category.image.clone_from(&record.image);
    category.parent_id = record.parent_id;
    category.ancestors.clone_from(&record.ancestors);
    category.level = record.level;
    category.sort_order = record.sort_order;
    category.is_active = record.is_active;
    category.meta_title.clone_from(&record.meta_title);
    category.meta_description.clone_from(&record.meta_description);
}

impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state()?.rows.get(&id).cloned())
    }

    async fn find_by_parent(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut children: Vec<Category> = self
            .state()?
            .rows
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect();

        children.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(children)
    }

    async fn count_children(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count = self
            .state()?
            .rows
            .values()
            .filter(|c| c.parent_id == Some(id))
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn taken_slugs(
        &self,
        base: &Slug,
        exclude: Option<CategoryId>,
    ) -> Result<HashSet<String>, RepositoryError> {
        let prefix = format!("{base}-");
        Ok(self
            .state()?
            .rows
            .values()
            .filter(|c| Some(c.id) != exclude)
            .map(|c| c.slug.as_str())
            .filter(|slug| *slug == base.as_str() || slug.starts_with(&prefix))
            .map(str::to_owned)
            .collect())
    }

    async fn list(&self, query: &CategoryQuery) -> Result<Vec<Category>, RepositoryError> {
        let mut matching: Vec<Category> = self
            .state()?
            .rows
            .values()
            .filter(|c| query.filter.matches(c))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort.field);
            match query.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(query.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit.max(0)).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &CategoryFilter) -> Result<i64, RepositoryError> {
        let count = self
            .state()?
            .rows
            .values()
            .filter(|c| filter.matches(c))
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn create(&self, record: &CategoryRecord) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        state.check_slug_free(&record.slug, None)?;
        state.check_parent_exists(record.parent_id)?;

        state.last_id += 1;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(state.last_id),
            name: record.name.clone(),
            slug: record.slug.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            parent_id: record.parent_id,
            ancestors: record.ancestors.clone(),
            level: record.level,
            sort_order: record.sort_order,
            is_active: record.is_active,
            meta_title: record.meta_title.clone(),
            meta_description: record.meta_description.clone(),
            created_at: now,
            updated_at: now,
        };

        state.rows.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
        descendant_paths: &[PathRewrite],
    ) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        if !state.rows.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        state.check_slug_free(&record.slug, Some(id))?;
        state.check_parent_exists(record.parent_id)?;

        // All checks pass before anything is written.
        let now = Utc::now();
        state.apply_rewrites(descendant_paths, now);
        let category = state.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        apply_record(category, record);
        category.updated_at = now;
        Ok(category.clone())
    }

    async fn rewrite_paths(&self, rewrites: &[PathRewrite]) -> Result<u64, RepositoryError> {
        let mut state = self.state()?;
        Ok(state.apply_rewrites(rewrites, Utc::now()))
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut state = self.state()?;
        if state.rows.values().any(|c| c.parent_id == Some(id)) {
            return Err(RepositoryError::Conflict(
                "category still has subcategories".to_string(),
            ));
        }
        Ok(state.rows.remove(&id).is_some())
    }
}
