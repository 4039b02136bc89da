//! Category request models: mutation inputs, list filters and pages.

use serde::{Deserialize, Deserializer, Serialize};

use backoffice_core::{Category, CategoryId};

/// Input for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    /// Display name (at least 3 characters).
    pub name: String,
    /// Optional slug hint; derived from `name` when absent.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub slug: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Image URL from the upload service.
    #[serde(default)]
    pub image: Option<String>,
    /// Parent category; `None` creates a root.
    #[serde(default, deserialize_with = "parent_ref")]
    pub parent_id: Option<CategoryId>,
    /// SEO title; defaults to `name`.
    #[serde(default)]
    pub meta_title: Option<String>,
    /// SEO description; defaults to an excerpt of `description`.
    #[serde(default)]
    pub meta_description: Option<String>,
    /// Display order among siblings (default 0).
    #[serde(default)]
    pub sort_order: Option<i32>,
    /// Storefront visibility (default true).
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update of a category. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Pinned slug. Takes precedence over a slug derived from a new name.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub slug: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New image URL (empty string clears it).
    #[serde(default)]
    pub image: Option<String>,
    /// `None` keeps the parent, `Some(None)` makes the category a root,
    /// `Some(Some(id))` moves it under `id`.
    #[serde(default, deserialize_with = "present_parent_ref")]
    pub parent_id: Option<Option<CategoryId>>,
    /// New SEO title.
    #[serde(default)]
    pub meta_title: Option<String>,
    /// New SEO description.
    #[serde(default)]
    pub meta_description: Option<String>,
    /// New display order.
    #[serde(default)]
    pub sort_order: Option<i32>,
    /// New visibility flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Filter criteria for listing categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Case-insensitive substring matched against name, description or slug.
    pub search: Option<String>,
    /// Exact tree depth.
    pub level: Option<i32>,
    /// Exact visibility flag.
    pub is_active: Option<bool>,
}

impl CategoryFilter {
    /// Returns `true` if `category` satisfies every clause of this filter.
    #[must_use]
    pub fn matches(&self, category: &Category) -> bool {
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            [
                category.name.as_str(),
                category.description.as_str(),
                category.slug.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        });

        search_ok
            && self.level.is_none_or(|level| category.level == level)
            && self.is_active.is_none_or(|active| category.is_active == active)
    }
}

/// Column to sort category lists by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Slug,
    Level,
    SortOrder,
}

impl SortField {
    /// SQL column backing this sort field.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Slug => "slug",
            Self::Level => "level",
            Self::SortOrder => "sort_order",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort order for category lists. Ties are always broken by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorySort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// A fully resolved list query handed to the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryQuery {
    pub filter: CategoryFilter,
    pub sort: CategorySort,
    /// Maximum number of rows.
    pub limit: i64,
    /// Number of rows to skip.
    pub offset: i64,
}

/// One page of a category listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub items: Vec<Category>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl CategoryPage {
    /// Build a page, deriving the page count from `total` and `limit`.
    #[must_use]
    pub fn new(items: Vec<Category>, total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 {
            total.saturating_add(limit - 1) / limit
        } else {
            0
        };
        Self {
            items,
            total,
            page,
            limit,
            pages,
        }
    }
}

// =============================================================================
// Deserialization helpers
// =============================================================================

/// Raw `parentId` as sent by admin forms: a number, a numeric string, or a
/// sentinel meaning "no parent".
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParent {
    Id(i32),
    Text(String),
}

const ROOT_SENTINELS: &[&str] = &["", "none", "null", "undefined"];

fn parse_parent<E: serde::de::Error>(raw: Option<RawParent>) -> Result<Option<CategoryId>, E> {
    match raw {
        None => Ok(None),
        Some(RawParent::Id(id)) => Ok(Some(CategoryId::new(id))),
        Some(RawParent::Text(text)) => {
            let text = text.trim();
            if ROOT_SENTINELS.contains(&text) {
                return Ok(None);
            }
            text.parse::<CategoryId>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid parent category id: {text}")))
        }
    }
}

fn parent_ref<'de, D>(deserializer: D) -> Result<Option<CategoryId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawParent>::deserialize(deserializer)?;
    parse_parent(raw)
}

/// Only called when the field is present, so the outer `Some` marks presence.
fn present_parent_ref<'de, D>(deserializer: D) -> Result<Option<Option<CategoryId>>, D::Error>
where
    D: Deserializer<'de>,
{
    parent_ref(deserializer).map(Some)
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
