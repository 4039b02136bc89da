//! Backoffice Core - Shared category types.
//!
//! This crate provides the types shared by every Backoffice component:
//! - `admin` - Category administration API and service layer
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, slugs, and the category tree model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
