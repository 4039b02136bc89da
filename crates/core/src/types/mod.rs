//! Core types for Backoffice.
//!
//! This module provides type-safe wrappers for the category domain.

pub mod category;
pub mod id;
pub mod slug;

pub use category::{AncestorRef, Category, MaterializedPath};
pub use id::*;
pub use slug::{Slug, SlugError, slugify};
