//! Operator-facing routes: release mutation and storage audit.
//!
//! ```text
//! PATCH /deployments/{key}/releases/{label}          -> update_release
//! GET   /deployments/{key}/releases/{label}/metrics  -> release_metrics
//! GET   /storage/audit                               -> storage_audit
//! ```

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{releases, storage_audit};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/deployments/{key}/releases/{label}",
            patch(releases::update_release),
        )
        .route(
            "/deployments/{key}/releases/{label}/metrics",
            get(releases::release_metrics),
        )
        .route("/storage/audit", get(storage_audit::storage_audit))
}
