//! Backoffice admin library.
//!
//! Category hierarchy management for the storefront back-office: the tree
//! service, its `PostgreSQL` persistence and the JSON API around it. Exposed
//! as a library so the CLI and integration tests can reuse it.
//!
//! # Security
//!
//! The API performs no authentication of its own. It binds to 127.0.0.1 by
//! default and must only be exposed behind the authenticating proxy.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
