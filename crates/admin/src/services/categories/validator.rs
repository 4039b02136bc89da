//! Structural safety checks for tree mutations.

use std::collections::HashSet;

use tracing::warn;

use backoffice_core::CategoryId;

use super::{CategoryError, CycleCheck};
use crate::db::CategoryRepository;

/// Rejects mutations that would corrupt the tree.
pub struct TreeMutationValidator<'r, R> {
    repo: &'r R,
    cycle_check: CycleCheck,
}

impl<'r, R: CategoryRepository> TreeMutationValidator<'r, R> {
    #[must_use]
    pub const fn new(repo: &'r R, cycle_check: CycleCheck) -> Self {
        Self { repo, cycle_check }
    }

    /// Check that `node` may be placed under `new_parent`.
    ///
    /// Always rejects self-parenting. Under [`CycleCheck::Deep`] it also walks
    /// the prospective parent's chain and rejects moves under a descendant.
    /// A missing parent is not reported here.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::InvalidParent` for a cyclic placement.
    pub async fn check_parent(
        &self,
        node: CategoryId,
        new_parent: CategoryId,
    ) -> Result<(), CategoryError> {
        if node == new_parent {
            return Err(CategoryError::InvalidParent(
                "Category cannot be its own parent".to_string(),
            ));
        }

        if self.cycle_check == CycleCheck::Shallow {
            return Ok(());
        }

        let mut visited = HashSet::new();
        let mut current = Some(new_parent);

        while let Some(id) = current {
            if id == node {
                return Err(CategoryError::InvalidParent(
                    "Category cannot be moved under one of its own subcategories".to_string(),
                ));
            }
            if !visited.insert(id) {
                // Pre-existing loop that does not involve `node`.
                warn!(category_id = %id, "Parent chain already contains a cycle");
                break;
            }
            current = match self.repo.find_by_id(id).await? {
                Some(category) => category.parent_id,
                None => None,
            };
        }

        Ok(())
    }

    /// Check that `node` has no children and may be deleted.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::HasChildren` with the direct child count.
    pub async fn check_delete(&self, node: CategoryId) -> Result<(), CategoryError> {
        let count = self.repo.count_children(node).await?;
        if count > 0 {
            return Err(CategoryError::HasChildren { count });
        }
        Ok(())
    }
}
