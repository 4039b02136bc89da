//! Materialized ancestor paths.
//!
//! A category stores its ancestor chain (root first) and depth so reads never
//! walk the tree. Paths are computed from the parent's stored path at write
//! time; the plans below re-derive them for whole subtrees when a rename or
//! move must be propagated, or when stored paths have drifted.

use std::collections::{HashSet, VecDeque};

use backoffice_core::{Category, CategoryId, MaterializedPath};

use super::CategoryError;
use crate::db::{CategoryRepository, PathRewrite};

/// Computes materialized paths from the repository's current state.
pub struct AncestorPathMaintainer<'r, R> {
    repo: &'r R,
}

impl<'r, R: CategoryRepository> AncestorPathMaintainer<'r, R> {
    #[must_use]
    pub const fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Path of a node placed under `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` if the parent does not exist.
    pub async fn resolve(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<MaterializedPath, CategoryError> {
        let Some(parent_id) = parent_id else {
            return Ok(MaterializedPath::root());
        };

        let parent = self
            .repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(CategoryError::parent_not_found)?;

        Ok(MaterializedPath::below(&parent))
    }

    /// Rewrites that bring every descendant of `node` in line with `node`'s
    /// current path, name and slug.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Repository` if children cannot be loaded.
    pub async fn descendant_rewrites(
        &self,
        node: &Category,
    ) -> Result<Vec<PathRewrite>, CategoryError> {
        let mut rewrites = Vec::new();
        self.plan_subtrees(vec![node.clone()], &mut rewrites).await?;
        Ok(rewrites)
    }

    /// Rewrites that repair every stale path reachable from the roots.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Repository` if the tree cannot be loaded.
    pub async fn rebuild_rewrites(&self) -> Result<Vec<PathRewrite>, CategoryError> {
        let mut rewrites = Vec::new();
        let mut roots = self.repo.find_by_parent(None).await?;

        let root_path = MaterializedPath::root();
        for root in &mut roots {
            if root.path() != root_path {
                rewrites.push(rewrite(root.id, root_path.clone()));
                root.ancestors = Vec::new();
                root.level = 0;
            }
        }

        self.plan_subtrees(roots, &mut rewrites).await?;
        Ok(rewrites)
    }

    /// Breadth-first walk below `starts`, which must already carry correct paths.
    async fn plan_subtrees(
        &self,
        starts: Vec<Category>,
        rewrites: &mut Vec<PathRewrite>,
    ) -> Result<(), CategoryError> {
        let mut visited: HashSet<CategoryId> = starts.iter().map(|c| c.id).collect();
        let mut queue: VecDeque<Category> = starts.into();

        while let Some(parent) = queue.pop_front() {
            for mut child in self.repo.find_by_parent(Some(parent.id)).await? {
                if !visited.insert(child.id) {
                    continue;
                }

                let expected = MaterializedPath::below(&parent);
                if child.path() != expected {
                    rewrites.push(rewrite(child.id, expected.clone()));
                    child.ancestors = expected.ancestors;
                    child.level = expected.level;
                }
                queue.push_back(child);
            }
        }

        Ok(())
    }
}

fn rewrite(id: CategoryId, path: MaterializedPath) -> PathRewrite {
    PathRewrite {
        id,
        ancestors: path.ancestors,
        level: path.level,
    }
}
