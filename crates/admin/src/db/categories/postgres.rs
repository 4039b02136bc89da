//! `PostgreSQL` category repository.
//!
//! Queries are built at runtime with bound parameters; the only interpolated
//! SQL is the `ORDER BY` clause, which comes from a closed set of columns.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use sqlx::types::Json;
use tracing::{debug, instrument};

use backoffice_core::{AncestorRef, Category, CategoryId, Slug};

use super::{CategoryRecord, CategoryRepository, PathRewrite};
use crate::db::RepositoryError;
use crate::models::category::{CategoryFilter, CategoryQuery};

const SLUG_UNIQUE_CONSTRAINT: &str = "categories_slug_key";
const PARENT_FK_CONSTRAINT: &str = "categories_parent_id_fkey";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, parent_id, ancestors, level, \
     sort_order, is_active, meta_title, meta_description, created_at, updated_at";

// Shared by list and count so both see the same rows.
const FILTER_CLAUSE: &str = r"
    ($1::text IS NULL
        OR strpos(lower(name), lower($1)) > 0
        OR strpos(lower(description), lower($1)) > 0
        OR strpos(lower(slug), lower($1)) > 0)
    AND ($2::int IS NULL OR level = $2)
    AND ($3::bool IS NULL OR is_active = $3)
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `admin.categories` queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    image: String,
    parent_id: Option<i32>,
    ancestors: Json<Vec<AncestorRef>>,
    level: i32,
    sort_order: i32,
    is_active: bool,
    meta_title: String,
    meta_description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug '{}' in database: {e}", row.slug))
        })?;

        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug,
            description: row.description,
            image: row.image,
            parent_id: row.parent_id.map(CategoryId::new),
            ancestors: row.ancestors.0,
            level: row.level,
            sort_order: row.sort_order,
            is_active: row.is_active,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_categories(rows: Vec<CategoryRow>) -> Result<Vec<Category>, RepositoryError> {
    rows.into_iter().map(Category::try_from).collect()
}

/// Map constraint violations on insert/update to repository errors.
fn map_write_error(e: sqlx::Error, record: &CategoryRecord) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some(SLUG_UNIQUE_CONSTRAINT) => {
                return RepositoryError::DuplicateSlug(record.slug.to_string());
            }
            Some(PARENT_FK_CONSTRAINT) => {
                return RepositoryError::Conflict("parent category no longer exists".to_string());
            }
            _ => {}
        }
    }
    RepositoryError::Database(e)
}

async fn apply_rewrites(
    tx: &mut Transaction<'_, Postgres>,
    rewrites: &[PathRewrite],
) -> Result<u64, RepositoryError> {
    let mut changed = 0;

    for rewrite in rewrites {
        let result = sqlx::query(
            r"
            UPDATE admin.categories
            SET ancestors = $2, level = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(rewrite.id)
        .bind(Json(&rewrite.ancestors))
        .bind(rewrite.level)
        .execute(&mut **tx)
        .await?;

        changed += result.rows_affected();
    }

    Ok(changed)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for category database operations.
pub struct PgCategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CategoryRepository for PgCategoryRepository<'_> {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM admin.categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_parent(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            SELECT {CATEGORY_COLUMNS}
            FROM admin.categories
            WHERE parent_id IS NOT DISTINCT FROM $1
            ORDER BY sort_order ASC, name ASC, id ASC
            "
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        into_categories(rows)
    }

    #[instrument(skip(self))]
    async fn count_children(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin.categories WHERE parent_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(base = %base))]
    async fn taken_slugs(
        &self,
        base: &Slug,
        exclude: Option<CategoryId>,
    ) -> Result<HashSet<String>, RepositoryError> {
        // Slugs are [a-z0-9-] only, so the LIKE pattern needs no escaping.
        let slugs: Vec<String> = sqlx::query_scalar(
            r"
            SELECT slug FROM admin.categories
            WHERE (slug = $1 OR slug LIKE $2)
              AND ($3::int IS NULL OR id <> $3)
            ",
        )
        .bind(base.as_str())
        .bind(format!("{base}-%"))
        .bind(exclude)
        .fetch_all(self.pool)
        .await?;

        debug!(count = slugs.len(), "Loaded taken slugs");
        Ok(slugs.into_iter().collect())
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &CategoryQuery) -> Result<Vec<Category>, RepositoryError> {
        let column = query.sort.field.column();
        let direction = query.sort.direction.keyword();
        let sql = format!(
            r"
            SELECT {CATEGORY_COLUMNS}
            FROM admin.categories
            WHERE {FILTER_CLAUSE}
            ORDER BY {column} {direction}, id {direction}
            LIMIT $4 OFFSET $5
            "
        );

        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(query.filter.search.as_deref())
            .bind(query.filter.level)
            .bind(query.filter.is_active)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(self.pool)
            .await?;

        into_categories(rows)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &CategoryFilter) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM admin.categories WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.search.as_deref())
        .bind(filter.level)
        .bind(filter.is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self, record), fields(slug = %record.slug))]
    async fn create(&self, record: &CategoryRecord) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO admin.categories (
                name, slug, description, image, parent_id, ancestors, level,
                sort_order, is_active, meta_title, meta_description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(&record.image)
        .bind(record.parent_id)
        .bind(Json(&record.ancestors))
        .bind(record.level)
        .bind(record.sort_order)
        .bind(record.is_active)
        .bind(&record.meta_title)
        .bind(&record.meta_description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, record))?;

        row.try_into()
    }

    #[instrument(
        skip(self, record, descendant_paths),
        fields(slug = %record.slug, descendants = descendant_paths.len())
    )]
    async fn update(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
        descendant_paths: &[PathRewrite],
    ) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE admin.categories
            SET
                name = $2,
                slug = $3,
                description = $4,
                image = $5,
                parent_id = $6,
                ancestors = $7,
                level = $8,
                sort_order = $9,
                is_active = $10,
                meta_title = $11,
                meta_description = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(&record.image)
        .bind(record.parent_id)
        .bind(Json(&record.ancestors))
        .bind(record.level)
        .bind(record.sort_order)
        .bind(record.is_active)
        .bind(&record.meta_title)
        .bind(&record.meta_description)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, record))?
        .ok_or(RepositoryError::NotFound)?;

        let changed = apply_rewrites(&mut tx, descendant_paths).await?;
        tx.commit().await?;

        if changed > 0 {
            debug!(changed, "Rewrote descendant paths");
        }
        row.try_into()
    }

    #[instrument(skip(self, rewrites), fields(count = rewrites.len()))]
    async fn rewrite_paths(&self, rewrites: &[PathRewrite]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let changed = apply_rewrites(&mut tx, rewrites).await?;
        tx.commit().await?;
        Ok(changed)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(PARENT_FK_CONSTRAINT)
                {
                    return RepositoryError::Conflict(
                        "category still has subcategories".to_string(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
