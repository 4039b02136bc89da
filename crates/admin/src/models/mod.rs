//! Domain models for admin.
//!
//! The persisted `Category` record lives in `backoffice-core`; this module
//! holds the request-side shapes built around it.

pub mod category;

pub use category::{
    CategoryFilter, CategoryPage, CategoryQuery, CategorySort, CreateCategoryInput, SortDirection,
    SortField, UpdateCategoryInput,
};
