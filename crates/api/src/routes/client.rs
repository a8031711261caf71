//! Client-facing routes: update checks and status reports.
//!
//! Mounted at the root so existing update clients keep working.
//!
//! ```text
//! GET  /updateCheck            -> update_check
//! POST /reportStatus/download  -> report_download
//! POST /reportStatus/deploy    -> report_deploy
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{report_status, update_check};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/updateCheck", get(update_check::update_check))
        .route(
            "/reportStatus/download",
            post(report_status::report_download),
        )
        .route("/reportStatus/deploy", post(report_status::report_deploy))
}
