//! Category tree model.
//!
//! Categories form a forest: each node has at most one parent, and every node
//! carries a materialized copy of its ancestor chain so read-side queries never
//! need to walk the tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryId, Slug};

/// A denormalized reference to an ancestor category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorRef {
    /// Ancestor ID.
    pub id: CategoryId,
    /// Ancestor display name at the time the path was materialized.
    pub name: String,
    /// Ancestor slug at the time the path was materialized.
    pub slug: Slug,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique category ID, assigned at creation.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Globally unique URL slug.
    pub slug: Slug,
    /// Free-form description (may contain HTML).
    pub description: String,
    /// Image URL supplied by the upload service.
    pub image: String,
    /// Parent category, `None` for roots.
    pub parent_id: Option<CategoryId>,
    /// Ancestor chain ordered root first, excluding this category.
    pub ancestors: Vec<AncestorRef>,
    /// Depth in the tree; 0 for roots.
    pub level: i32,
    /// Display order among siblings.
    pub sort_order: i32,
    /// Whether the storefront shows this category.
    pub is_active: bool,
    /// SEO title.
    pub meta_title: String,
    /// SEO description.
    pub meta_description: String,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// The reference children of this category store in their ancestor chain.
    #[must_use]
    pub fn as_ancestor(&self) -> AncestorRef {
        AncestorRef {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }

    /// The materialized path currently stored on this category.
    #[must_use]
    pub fn path(&self) -> MaterializedPath {
        MaterializedPath {
            ancestors: self.ancestors.clone(),
            level: self.level,
        }
    }
}

/// Ancestor chain and depth of a tree position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterializedPath {
    /// Ancestors ordered root first.
    pub ancestors: Vec<AncestorRef>,
    /// Depth, always equal to `ancestors.len()`.
    pub level: i32,
}

impl MaterializedPath {
    /// The path of a root category.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            ancestors: Vec::new(),
            level: 0,
        }
    }

    /// The path of a direct child of `parent`, based on the parent's stored path.
    #[must_use]
    pub fn below(parent: &Category) -> Self {
        let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
        ancestors.extend(parent.ancestors.iter().cloned());
        ancestors.push(parent.as_ancestor());

        Self {
            ancestors,
            level: parent.level.saturating_add(1),
        }
    }

    /// Returns `true` if `level` matches the ancestor count.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        usize::try_from(self.level).is_ok_and(|level| level == self.ancestors.len())
    }
}
