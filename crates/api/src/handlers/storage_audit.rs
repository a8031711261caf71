//! Storage reconciliation endpoint.

use axum::extract::State;
use axum::Json;

use hotpush_core::reconcile::{self, ReconciliationReport};
use hotpush_core::release::Release;
use hotpush_db::repositories::PackageRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /storage/audit
// ---------------------------------------------------------------------------

/// Cross-check the full catalog against the blob store.
///
/// Read-only. The catalog scan and the store enumeration are separate
/// reads, so a release published mid-audit may transiently show as
/// missing. A store that cannot be enumerated aborts the whole audit
/// (503) rather than returning a misleading partial report.
pub async fn storage_audit(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReconciliationReport>>> {
    let catalog: Vec<Release> = PackageRepo::list_all(&state.pool)
        .await?
        .into_iter()
        .map(Release::from)
        .collect();

    let store = state.blob_store.enumerate().await?;

    let report = reconcile::audit(&catalog, &store);
    tracing::info!(
        valid = report.summary.valid_count,
        missing = report.summary.missing_count,
        orphaned = report.summary.orphaned_count,
        "Storage audit complete"
    );

    Ok(Json(DataResponse { data: report }))
}
