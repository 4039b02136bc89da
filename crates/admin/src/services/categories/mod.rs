//! Category tree service.
//!
//! [`CategoryService`] is the only entry point for reading and mutating
//! categories. Each mutation runs the same pipeline:
//!
//! 1. field validation ([`rules`])
//! 2. structural checks ([`TreeMutationValidator`])
//! 3. slug resolution ([`SlugGenerator`])
//! 4. ancestor path resolution ([`AncestorPathMaintainer`])
//! 5. persistence through a [`CategoryRepository`]
//!
//! Paths are materialized for the mutated node only. Descendants keep their
//! stored paths unless [`TreePolicy::cascade_paths`] is enabled; stale paths
//! can be repaired later with [`CategoryService::rebuild_paths`].

pub mod ancestry;
pub mod error;
pub mod rules;
pub mod seo;
pub mod slug;
pub mod validator;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, instrument, warn};

use backoffice_core::{Category, CategoryId};

use crate::config::CategoryConfig;
use crate::db::{CategoryRecord, CategoryRepository, PathRewrite, RepositoryError};
use crate::models::category::{
    CategoryFilter, CategoryPage, CategoryQuery, CategorySort, CreateCategoryInput,
    UpdateCategoryInput,
};

pub use ancestry::AncestorPathMaintainer;
pub use error::CategoryError;
pub use slug::SlugGenerator;
pub use validator::TreeMutationValidator;

// =============================================================================
// Policy
// =============================================================================

/// How far the parent check looks when a category is moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleCheck {
    /// Walk the new parent's whole chain.
    #[default]
    Deep,
    /// Only reject a category becoming its own parent.
    Shallow,
}

impl fmt::Display for CycleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deep => f.write_str("deep"),
            Self::Shallow => f.write_str("shallow"),
        }
    }
}

/// Error returned when parsing an unknown [`CycleCheck`].
#[derive(Debug, Error)]
#[error("expected 'deep' or 'shallow', got '{0}'")]
pub struct ParseCycleCheckError(String);

impl FromStr for CycleCheck {
    type Err = ParseCycleCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deep" => Ok(Self::Deep),
            "shallow" => Ok(Self::Shallow),
            _ => Err(ParseCycleCheckError(s.to_string())),
        }
    }
}

/// Tree mutation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreePolicy {
    pub cycle_check: CycleCheck,
    /// Rewrite descendant paths after a rename, slug change or move.
    pub cascade_paths: bool,
    /// Slug re-resolutions allowed after the unique index rejects a write.
    pub slug_retries: u32,
}

impl TreePolicy {
    pub const DEFAULT_SLUG_RETRIES: u32 = 3;
}

impl Default for TreePolicy {
    fn default() -> Self {
        Self {
            cycle_check: CycleCheck::Deep,
            cascade_paths: false,
            slug_retries: Self::DEFAULT_SLUG_RETRIES,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Write<'a> {
    Create,
    /// Update of the stored category.
    Update(&'a Category),
}

impl Write<'_> {
    const fn exclude(self) -> Option<CategoryId> {
        match self {
            Self::Create => None,
            Self::Update(current) => Some(current.id),
        }
    }
}

/// Category operations over a [`CategoryRepository`].
pub struct CategoryService<R> {
    repo: R,
    config: CategoryConfig,
}

impl<R: CategoryRepository> CategoryService<R> {
    /// Create a service over `repo`.
    #[must_use]
    pub const fn new(repo: R, config: CategoryConfig) -> Self {
        Self { repo, config }
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repo
    }

    /// One page of categories.
    ///
    /// `page` defaults to 1 and `limit` to the configured page size.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Validation` for a page below 1 or a limit
    /// outside `1..=max_page_size`.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: CategoryFilter,
        sort: CategorySort,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<CategoryPage, CategoryError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(self.config.default_page_size);

        if page < 1 {
            return Err(CategoryError::Validation(
                "Page must be at least 1".to_string(),
            ));
        }
        if !(1..=self.config.max_page_size).contains(&limit) {
            return Err(CategoryError::Validation(format!(
                "Limit must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| CategoryError::Validation("Page is out of range".to_string()))?;

        let query = CategoryQuery {
            filter,
            sort,
            limit,
            offset,
        };
        let items = self.repo.list(&query).await?;
        let total = self.repo.count(&query.filter).await?;

        Ok(CategoryPage::new(items, total, page, limit))
    }

    /// Fetch one category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` if `id` does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CategoryId) -> Result<Category, CategoryError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(CategoryError::category_not_found)
    }

    /// Direct children of `parent_id`, or the roots when `None`.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` if `parent_id` does not exist.
    #[instrument(skip(self))]
    pub async fn children(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, CategoryError> {
        if let Some(id) = parent_id {
            self.get(id).await?;
        }
        Ok(self.repo.find_by_parent(parent_id).await?)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// - `CategoryError::Validation` for invalid fields
    /// - `CategoryError::NotFound` if the parent does not exist
    /// - `CategoryError::Repository` on storage failure
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryError> {
        let name = rules::name(&input.name)?;
        rules::slug_hint(input.slug.as_deref())?;
        rules::display_fields(
            input.description.as_deref(),
            input.meta_title.as_deref(),
            input.meta_description.as_deref(),
        )?;
        rules::sort_order(input.sort_order)?;

        let path = AncestorPathMaintainer::new(&self.repo)
            .resolve(input.parent_id)
            .await?;

        let slug_text = input.slug.unwrap_or_else(|| name.clone());
        let mut record = CategoryRecord {
            slug: slug::base_slug(&slug_text)?,
            description: input.description.unwrap_or_default(),
            image: input.image.unwrap_or_default(),
            parent_id: input.parent_id,
            ancestors: path.ancestors,
            level: path.level,
            sort_order: input.sort_order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            meta_title: input.meta_title.unwrap_or_default(),
            meta_description: input.meta_description.unwrap_or_default(),
            name,
        };
        seo::apply_defaults(
            &record.name,
            &record.description,
            &mut record.meta_title,
            &mut record.meta_description,
        );

        let category = self
            .write_with_slug_retry(Write::Create, Some(&slug_text), &mut record)
            .await?;

        info!(
            category_id = %category.id,
            slug = %category.slug,
            level = category.level,
            "Category created"
        );
        Ok(category)
    }

    /// Apply a partial update to a category.
    ///
    /// The slug is regenerated only when the name changes and no slug is
    /// pinned. The path is recomputed only when `parent_id` is supplied.
    ///
    /// # Errors
    ///
    /// - `CategoryError::NotFound` if the category or new parent does not exist
    /// - `CategoryError::Validation` for invalid fields
    /// - `CategoryError::InvalidParent` for a cyclic placement
    /// - `CategoryError::Repository` on storage failure
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: CategoryId,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryError> {
        let current = self.get(id).await?;

        let name = input.name.as_deref().map(rules::name).transpose()?;
        rules::slug_hint(input.slug.as_deref())?;
        rules::display_fields(
            input.description.as_deref(),
            input.meta_title.as_deref(),
            input.meta_description.as_deref(),
        )?;
        rules::sort_order(input.sort_order)?;

        if let Some(Some(parent_id)) = input.parent_id {
            TreeMutationValidator::new(&self.repo, self.config.policy.cycle_check)
                .check_parent(id, parent_id)
                .await?;
        }

        let mut record = CategoryRecord::from(&current);

        if let Some(parent_id) = input.parent_id {
            let path = AncestorPathMaintainer::new(&self.repo)
                .resolve(parent_id)
                .await?;
            record.parent_id = parent_id;
            record.ancestors = path.ancestors;
            record.level = path.level;
        }

        let renamed = name.as_ref().is_some_and(|n| *n != current.name);
        if let Some(name) = name {
            record.name = name;
        }
        if let Some(description) = input.description {
            record.description = description;
        }
        if let Some(image) = input.image {
            record.image = image;
        }
        if let Some(meta_title) = input.meta_title {
            record.meta_title = meta_title;
        }
        if let Some(meta_description) = input.meta_description {
            record.meta_description = meta_description;
        }
        if let Some(sort_order) = input.sort_order {
            record.sort_order = sort_order;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }

        let slug_text = match input.slug {
            Some(hint) => Some(hint),
            None if renamed => Some(record.name.clone()),
            None => None,
        };
        if slug_text.is_some() {
            seo::apply_defaults(
                &record.name,
                &record.description,
                &mut record.meta_title,
                &mut record.meta_description,
            );
        }

        let updated = self
            .write_with_slug_retry(Write::Update(&current), slug_text.as_deref(), &mut record)
            .await?;

        info!(category_id = %updated.id, slug = %updated.slug, "Category updated");
        Ok(updated)
    }

    /// Delete a childless category.
    ///
    /// # Errors
    ///
    /// - `CategoryError::NotFound` if `id` does not exist
    /// - `CategoryError::HasChildren` if it still has subcategories
    /// - `CategoryError::Repository` on storage failure
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), CategoryError> {
        self.get(id).await?;

        let validator = TreeMutationValidator::new(&self.repo, self.config.policy.cycle_check);
        validator.check_delete(id).await?;

        match self.repo.delete(id).await {
            Ok(true) => {
                info!(category_id = %id, "Category deleted");
                Ok(())
            }
            Ok(false) => Err(CategoryError::category_not_found()),
            // A child was added between the guard and the delete.
            Err(RepositoryError::Conflict(reason)) => {
                validator.check_delete(id).await?;
                Err(RepositoryError::Conflict(reason).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite every stale materialized path reachable from the roots.
    ///
    /// Returns the number of categories rewritten.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn rebuild_paths(&self) -> Result<u64, CategoryError> {
        let rewrites = AncestorPathMaintainer::new(&self.repo)
            .rebuild_rewrites()
            .await?;
        if rewrites.is_empty() {
            info!("All category paths are consistent");
            return Ok(0);
        }

        let changed = self.repo.rewrite_paths(&rewrites).await?;
        info!(changed, "Rebuilt category paths");
        Ok(changed)
    }

    /// Descendant rewrites to store alongside `record`, empty unless the
    /// cascade policy is on and the node's name, slug or path changes.
    async fn descendant_paths(
        &self,
        current: &Category,
        record: &CategoryRecord,
    ) -> Result<Vec<PathRewrite>, CategoryError> {
        if !self.config.policy.cascade_paths {
            return Ok(Vec::new());
        }

        let stub_changed = record.name != current.name || record.slug != current.slug;
        let moved = record.parent_id != current.parent_id
            || record.ancestors != current.ancestors
            || record.level != current.level;
        if !stub_changed && !moved {
            return Ok(Vec::new());
        }

        let node = Category {
            name: record.name.clone(),
            slug: record.slug.clone(),
            parent_id: record.parent_id,
            ancestors: record.ancestors.clone(),
            level: record.level,
            ..current.clone()
        };
        let rewrites = AncestorPathMaintainer::new(&self.repo)
            .descendant_rewrites(&node)
            .await?;
        if !rewrites.is_empty() {
            info!(category_id = %node.id, count = rewrites.len(), "Cascading path to descendants");
        }
        Ok(rewrites)
    }

    /// Persist `record`, re-resolving its slug from `slug_text` whenever the
    /// unique index wins a race against the in-memory suffix search.
    ///
    /// With `slug_text` of `None` the record's slug is written as-is.
    async fn write_with_slug_retry(
        &self,
        write: Write<'_>,
        slug_text: Option<&str>,
        record: &mut CategoryRecord,
    ) -> Result<Category, CategoryError> {
        let generator = SlugGenerator::new(&self.repo);
        let mut attempt: u32 = 0;

        loop {
            if let Some(text) = slug_text {
                record.slug = generator.generate(text, write.exclude()).await?;
            }

            let result = match write {
                Write::Create => self.repo.create(record).await,
                Write::Update(current) => {
                    let descendants = self.descendant_paths(current, record).await?;
                    self.repo.update(current.id, record, &descendants).await
                }
            };

            match result {
                Ok(category) => return Ok(category),
                Err(RepositoryError::DuplicateSlug(slug))
                    if slug_text.is_some() && attempt < self.config.policy.slug_retries =>
                {
                    attempt += 1;
                    warn!(%slug, attempt, "Slug taken concurrently, retrying");
                }
                Err(RepositoryError::NotFound) => return Err(CategoryError::category_not_found()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use backoffice_core::{MaterializedPath, Slug};

    use super::*;
    use crate::db::{InMemoryCategoryRepository, PathRewrite};

    fn service() -> CategoryService<InMemoryCategoryRepository> {
        CategoryService::new(InMemoryCategoryRepository::new(), CategoryConfig::default())
    }

    fn service_with(policy: TreePolicy) -> CategoryService<InMemoryCategoryRepository> {
        CategoryService::new(
            InMemoryCategoryRepository::new(),
            CategoryConfig {
                policy,
                ..CategoryConfig::default()
            },
        )
    }

    fn named(name: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            ..CreateCategoryInput::default()
        }
    }

    fn child(name: &str, parent: &Category) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            parent_id: Some(parent.id),
            ..CreateCategoryInput::default()
        }
    }

    #[test]
    fn test_cycle_check_parse() {
        assert_eq!("deep".parse::<CycleCheck>().unwrap(), CycleCheck::Deep);
        assert_eq!(" Shallow ".parse::<CycleCheck>().unwrap(), CycleCheck::Shallow);
        assert!("sideways".parse::<CycleCheck>().is_err());
        assert_eq!(CycleCheck::Shallow.to_string(), "shallow");
    }

    #[tokio::test]
    async fn test_create_root() {
        let svc = service();
        let root = svc.create(named("Men's Shoes")).await.unwrap();

        assert_eq!(root.slug.as_str(), "mens-shoes");
        assert!(root.ancestors.is_empty());
        assert_eq!(root.level, 0);
        assert!(root.is_active);
        assert_eq!(root.sort_order, 0);
        assert_eq!(root.meta_title, "Men's Shoes");
    }

    #[tokio::test]
    async fn test_create_child_materializes_path() {
        let svc = service();
        let electronics = svc.create(named("Electronics")).await.unwrap();
        let laptops = svc.create(child("Laptops", &electronics)).await.unwrap();
        let gaming = svc.create(child("Gaming Laptops", &laptops)).await.unwrap();

        assert_eq!(gaming.level, 2);
        assert_eq!(
            gaming.ancestors,
            vec![electronics.as_ancestor(), laptops.as_ancestor()]
        );
        assert!(gaming.path().is_consistent());
    }

    #[tokio::test]
    async fn test_duplicate_names_get_suffixes() {
        let svc = service();
        let slugs: Vec<String> = [
            svc.create(named("Men's Shoes")).await.unwrap(),
            svc.create(named("Men's Shoes")).await.unwrap(),
            svc.create(named("Men's Shoes")).await.unwrap(),
        ]
        .into_iter()
        .map(|c| c.slug.into_inner())
        .collect();

        assert_eq!(slugs, ["mens-shoes", "mens-shoes-1", "mens-shoes-2"]);
    }

    #[tokio::test]
    async fn test_create_uses_slug_hint() {
        let svc = service();
        let input = CreateCategoryInput {
            slug: Some("Shoes For Men".to_string()),
            ..named("Men's Shoes")
        };
        let created = svc.create(input).await.unwrap();
        assert_eq!(created.slug.as_str(), "shoes-for-men");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let svc = service();
        assert!(matches!(
            svc.create(named("TV")).await.unwrap_err(),
            CategoryError::Validation(_)
        ));
        assert!(matches!(
            svc.create(named("!!!")).await.unwrap_err(),
            CategoryError::Validation(_)
        ));
        let negative = CreateCategoryInput {
            sort_order: Some(-1),
            ..named("Laptops")
        };
        assert!(matches!(
            svc.create(negative).await.unwrap_err(),
            CategoryError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_create_with_missing_parent() {
        let svc = service();
        let input = CreateCategoryInput {
            parent_id: Some(CategoryId::new(404)),
            ..named("Laptops")
        };
        assert!(matches!(
            svc.create(input).await.unwrap_err(),
            CategoryError::NotFound(_)
        ));
        assert!(svc.repository().snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_description_only_keeps_tree_fields() {
        let svc = service();
        let electronics = svc.create(named("Electronics")).await.unwrap();
        let laptops = svc.create(child("Laptops", &electronics)).await.unwrap();

        let updated = svc
            .update(
                laptops.id,
                UpdateCategoryInput {
                    description: Some("Portable computers".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description, "Portable computers");
        assert_eq!(updated.slug, laptops.slug);
        assert_eq!(updated.ancestors, laptops.ancestors);
        assert_eq!(updated.level, laptops.level);
    }

    #[tokio::test]
    async fn test_update_rename_regenerates_slug() {
        let svc = service();
        let created = svc.create(named("Laptops")).await.unwrap();
        let renamed = svc
            .update(
                created.id,
                UpdateCategoryInput {
                    name: Some("Notebooks".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug.as_str(), "notebooks");
        // Title was already set at creation.
        assert_eq!(renamed.meta_title, "Laptops");
    }

    #[tokio::test]
    async fn test_update_same_name_keeps_slug() {
        let svc = service();
        let created = svc.create(named("Laptops")).await.unwrap();
        let updated = svc
            .update(
                created.id,
                UpdateCategoryInput {
                    name: Some(" Laptops ".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, created.slug);
    }

    #[tokio::test]
    async fn test_update_pinned_slug_checked_against_others() {
        let svc = service();
        svc.create(named("Phones")).await.unwrap();
        let laptops = svc.create(named("Laptops")).await.unwrap();

        let updated = svc
            .update(
                laptops.id,
                UpdateCategoryInput {
                    slug: Some("phones".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug.as_str(), "phones-1");
    }

    #[tokio::test]
    async fn test_update_self_parent_rejected() {
        let svc = service();
        let created = svc.create(named("Electronics")).await.unwrap();
        let err = svc
            .update(
                created.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(created.id)),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CategoryError::InvalidParent(_)));
        assert_eq!(svc.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_move_and_make_root() {
        let svc = service();
        let electronics = svc.create(named("Electronics")).await.unwrap();
        let computers = svc.create(named("Computers")).await.unwrap();
        let laptops = svc.create(child("Laptops", &electronics)).await.unwrap();

        let moved = svc
            .update(
                laptops.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(computers.id)),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(computers.id));
        assert_eq!(moved.ancestors, vec![computers.as_ancestor()]);

        let root = svc
            .update(
                laptops.id,
                UpdateCategoryInput {
                    parent_id: Some(None),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert!(root.parent_id.is_none());
        assert_eq!(root.path(), MaterializedPath::root());
    }

    #[tokio::test]
    async fn test_update_missing_category_or_parent() {
        let svc = service();
        let created = svc.create(named("Electronics")).await.unwrap();

        let err = svc
            .update(CategoryId::new(77), UpdateCategoryInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(msg) if msg == "Category not found"));

        let err = svc
            .update(
                created.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(CategoryId::new(77))),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(msg) if msg == "Parent category not found"));
    }

    #[tokio::test]
    async fn test_deep_cycle_rejected_by_default() {
        let svc = service();
        let a = svc.create(named("Electronics")).await.unwrap();
        let b = svc.create(child("Laptops", &a)).await.unwrap();

        let err = svc
            .update(
                a.id,
                UpdateCategoryInput {
                    parent_id: Some(Some(b.id)),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::InvalidParent(_)));
    }

    #[tokio::test]
    async fn test_descendants_not_cascaded_by_default() {
        let svc = service();
        let a = svc.create(named("Electronics")).await.unwrap();
        let b = svc.create(child("Laptops", &a)).await.unwrap();

        svc.update(
            a.id,
            UpdateCategoryInput {
                name: Some("Consumer Electronics".to_string()),
                ..UpdateCategoryInput::default()
            },
        )
        .await
        .unwrap();

        let stale = svc.get(b.id).await.unwrap();
        assert_eq!(stale.ancestors[0].name, "Electronics");
    }

    #[tokio::test]
    async fn test_cascade_policy_rewrites_descendants() {
        let svc = service_with(TreePolicy {
            cascade_paths: true,
            ..TreePolicy::default()
        });
        let a = svc.create(named("Electronics")).await.unwrap();
        let b = svc.create(child("Laptops", &a)).await.unwrap();
        let c = svc.create(child("Gaming Laptops", &b)).await.unwrap();

        let renamed = svc
            .update(
                a.id,
                UpdateCategoryInput {
                    name: Some("Consumer Electronics".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();

        let c = svc.get(c.id).await.unwrap();
        assert_eq!(c.ancestors[0], renamed.as_ancestor());
        assert_eq!(c.ancestors[0].slug.as_str(), "consumer-electronics");
    }

    #[tokio::test]
    async fn test_rebuild_paths_repairs_stale_descendants() {
        let svc = service();
        let a = svc.create(named("Electronics")).await.unwrap();
        let b = svc.create(child("Laptops", &a)).await.unwrap();
        let c = svc.create(child("Gaming Laptops", &b)).await.unwrap();
        let computers = svc.create(named("Computers")).await.unwrap();

        svc.update(
            b.id,
            UpdateCategoryInput {
                parent_id: Some(Some(computers.id)),
                ..UpdateCategoryInput::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.get(c.id).await.unwrap().ancestors[0].id, a.id);

        assert_eq!(svc.rebuild_paths().await.unwrap(), 1);
        let c = svc.get(c.id).await.unwrap();
        assert_eq!(c.ancestors[0].id, computers.id);
        assert_eq!(c.level, 2);

        assert_eq!(svc.rebuild_paths().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_guard_and_success() {
        let svc = service();
        let shoes = svc.create(named("Men's Shoes")).await.unwrap();
        let sneakers = svc.create(child("Sneakers", &shoes)).await.unwrap();

        let err = svc.delete(shoes.id).await.unwrap_err();
        assert!(matches!(err, CategoryError::HasChildren { count: 1 }));
        assert!(svc.get(shoes.id).await.is_ok());
        assert!(svc.get(sneakers.id).await.is_ok());

        svc.delete(sneakers.id).await.unwrap();
        svc.delete(shoes.id).await.unwrap();
        assert!(matches!(
            svc.delete(shoes.id).await.unwrap_err(),
            CategoryError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_children_listing() {
        let svc = service();
        let a = svc.create(named("Electronics")).await.unwrap();
        svc.create(child("Phones", &a)).await.unwrap();
        svc.create(child("Laptops", &a)).await.unwrap();

        let names: Vec<String> = svc
            .children(Some(a.id))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Laptops", "Phones"]);
        assert_eq!(svc.children(None).await.unwrap().len(), 1);
        assert!(svc.children(Some(CategoryId::new(50))).await.is_err());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let svc = service();
        for i in 0..15 {
            svc.create(named(&format!("Category {i:02}"))).await.unwrap();
        }

        let page = svc
            .list(CategoryFilter::default(), CategorySort::default(), Some(2), Some(10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 15);
        assert_eq!(page.pages, 2);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let svc = service();
        for (page, limit) in [(Some(0), None), (None, Some(0)), (None, Some(101))] {
            let err = svc
                .list(CategoryFilter::default(), CategorySort::default(), page, limit)
                .await
                .unwrap_err();
            assert!(matches!(err, CategoryError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let svc = service();
        let a = svc.create(named("Electronics")).await.unwrap();
        svc.create(child("Laptops", &a)).await.unwrap();
        let hidden = CreateCategoryInput {
            is_active: Some(false),
            description: Some("Retro ELECTRONIC gear".to_string()),
            ..named("Vintage")
        };
        svc.create(hidden).await.unwrap();

        let search = CategoryFilter {
            search: Some("electronic".to_string()),
            ..CategoryFilter::default()
        };
        let page = svc
            .list(search, CategorySort::default(), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let level_one = CategoryFilter {
            level: Some(1),
            ..CategoryFilter::default()
        };
        let page = svc
            .list(level_one, CategorySort::default(), None, None)
            .await
            .unwrap();
        assert_eq!(page.items[0].name, "Laptops");

        let inactive = CategoryFilter {
            is_active: Some(false),
            ..CategoryFilter::default()
        };
        let page = svc
            .list(inactive, CategorySort::default(), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    // -------------------------------------------------------------------------
    // Injected storage faults
    // -------------------------------------------------------------------------

    /// Wraps the in-memory store with two switchable faults:
    ///
    /// - `blind` hides taken slugs from the next lookup, as if a concurrent
    ///   writer claimed the slug between lookup and insert.
    /// - `abort_subtree_writes` fails any update carrying descendant paths,
    ///   as if its transaction rolled back.
    struct FlakyRepository {
        inner: InMemoryCategoryRepository,
        blind: AtomicBool,
        abort_subtree_writes: AtomicBool,
    }

    impl CategoryRepository for FlakyRepository {
        async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_parent(
            &self,
            parent_id: Option<CategoryId>,
        ) -> Result<Vec<Category>, RepositoryError> {
            self.inner.find_by_parent(parent_id).await
        }

        async fn count_children(&self, id: CategoryId) -> Result<i64, RepositoryError> {
            self.inner.count_children(id).await
        }

        async fn taken_slugs(
            &self,
            base: &Slug,
            exclude: Option<CategoryId>,
        ) -> Result<HashSet<String>, RepositoryError> {
            if self.blind.swap(false, Ordering::SeqCst) {
                return Ok(HashSet::new());
            }
            self.inner.taken_slugs(base, exclude).await
        }

        async fn list(&self, query: &CategoryQuery) -> Result<Vec<Category>, RepositoryError> {
            self.inner.list(query).await
        }

        async fn count(&self, filter: &CategoryFilter) -> Result<i64, RepositoryError> {
            self.inner.count(filter).await
        }

        async fn create(&self, record: &CategoryRecord) -> Result<Category, RepositoryError> {
            self.inner.create(record).await
        }

        async fn update(
            &self,
            id: CategoryId,
            record: &CategoryRecord,
            descendant_paths: &[PathRewrite],
        ) -> Result<Category, RepositoryError> {
            if !descendant_paths.is_empty() && self.abort_subtree_writes.load(Ordering::SeqCst) {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.update(id, record, descendant_paths).await
        }

        async fn rewrite_paths(&self, rewrites: &[PathRewrite]) -> Result<u64, RepositoryError> {
            self.inner.rewrite_paths(rewrites).await
        }

        async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
            self.inner.delete(id).await
        }
    }

    fn flaky(policy: TreePolicy) -> CategoryService<FlakyRepository> {
        CategoryService::new(
            FlakyRepository {
                inner: InMemoryCategoryRepository::new(),
                blind: AtomicBool::new(false),
                abort_subtree_writes: AtomicBool::new(false),
            },
            CategoryConfig {
                policy,
                ..CategoryConfig::default()
            },
        )
    }

    fn racing(slug_retries: u32) -> CategoryService<FlakyRepository> {
        flaky(TreePolicy {
            slug_retries,
            ..TreePolicy::default()
        })
    }

    #[tokio::test]
    async fn test_slug_race_retried() {
        let svc = racing(3);
        svc.create(named("Laptops")).await.unwrap();

        svc.repository().blind.store(true, Ordering::SeqCst);
        let second = svc.create(named("Laptops")).await.unwrap();
        assert_eq!(second.slug.as_str(), "laptops-1");
    }

    #[tokio::test]
    async fn test_slug_race_without_retries_surfaces_repository_error() {
        let svc = racing(0);
        svc.create(named("Laptops")).await.unwrap();

        svc.repository().blind.store(true, Ordering::SeqCst);
        let err = svc.create(named("Laptops")).await.unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Repository(RepositoryError::DuplicateSlug(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_cascade_leaves_renamed_node_unchanged() {
        let svc = flaky(TreePolicy {
            cascade_paths: true,
            ..TreePolicy::default()
        });
        let electronics = svc.create(named("Electronics")).await.unwrap();
        let laptops = svc.create(child("Laptops", &electronics)).await.unwrap();

        svc.repository()
            .abort_subtree_writes
            .store(true, Ordering::SeqCst);
        let err = svc
            .update(
                electronics.id,
                UpdateCategoryInput {
                    name: Some("Gadgets".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CategoryError::Repository(_)));
        assert_eq!(svc.get(electronics.id).await.unwrap(), electronics);
        assert_eq!(svc.get(laptops.id).await.unwrap(), laptops);
    }

    #[tokio::test]
    async fn test_update_without_descendants_ignores_subtree_fault() {
        let svc = flaky(TreePolicy {
            cascade_paths: true,
            ..TreePolicy::default()
        });
        let electronics = svc.create(named("Electronics")).await.unwrap();

        svc.repository()
            .abort_subtree_writes
            .store(true, Ordering::SeqCst);
        let renamed = svc
            .update(
                electronics.id,
                UpdateCategoryInput {
                    name: Some("Gadgets".to_string()),
                    ..UpdateCategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug.as_str(), "gadgets");
    }
}
