//! API route handlers for admin.
//!
//! JSON endpoints share one response envelope: `success` plus either `data`
//! or a `message`.

pub mod categories;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(categories::router())
}
