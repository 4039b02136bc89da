//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness check
//! GET    /health/ready                        - Database readiness check
//!
//! # Categories (JSON)
//! GET    /api/admin/categories                - Filtered, sorted, paginated listing
//! POST   /api/admin/categories                - Create category
//! GET    /api/admin/categories/{id}           - Category detail
//! PUT    /api/admin/categories/{id}           - Partial update
//! DELETE /api/admin/categories/{id}           - Delete childless category
//! GET    /api/admin/categories/{id}/children  - Direct subcategories
//! ```
//!
//! Authentication happens in front of this service; see the crate docs.

pub mod api;

use axum::Router;

use crate::state::AppState;

/// Create all routes for the admin API.
pub fn routes() -> Router<AppState> {
    Router::new().merge(api::router())
}
