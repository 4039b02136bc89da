//! Integration tests for the Backoffice.
//!
//! # Running Tests
//!
//! ```bash
//! # Service scenarios (no external dependencies)
//! cargo test -p backoffice-integration-tests
//!
//! # HTTP tests against a running admin server with a migrated database
//! cargo run -p backoffice-cli -- migrate
//! cargo run -p backoffice-admin &
//! cargo test -p backoffice-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `categories_service` - Category tree scenarios on the in-memory repository
//! - `admin_categories_api` - Category JSON API over HTTP

use backoffice_admin::config::CategoryConfig;
use backoffice_admin::db::InMemoryCategoryRepository;
use backoffice_admin::models::CreateCategoryInput;
use backoffice_admin::services::{CategoryService, TreePolicy};
use backoffice_core::CategoryId;

/// Service over an empty in-memory repository with default policy.
#[must_use]
pub fn memory_service() -> CategoryService<InMemoryCategoryRepository> {
    memory_service_with(TreePolicy::default())
}

/// Service over an empty in-memory repository with `policy`.
#[must_use]
pub fn memory_service_with(policy: TreePolicy) -> CategoryService<InMemoryCategoryRepository> {
    CategoryService::new(
        InMemoryCategoryRepository::new(),
        CategoryConfig {
            policy,
            ..CategoryConfig::default()
        },
    )
}

/// Create input for a category named `name` under `parent`.
#[must_use]
pub fn category_input(name: &str, parent: Option<CategoryId>) -> CreateCategoryInput {
    CreateCategoryInput {
        name: name.to_string(),
        parent_id: parent,
        ..CreateCategoryInput::default()
    }
}

/// Base URL for admin API (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}
