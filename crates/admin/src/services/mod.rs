//! Business logic services for admin.
//!
//! # Services
//!
//! - `categories` - Category tree: slugs, materialized paths, safe mutations

pub mod categories;

pub use categories::{CategoryError, CategoryService, CycleCheck, TreePolicy};
