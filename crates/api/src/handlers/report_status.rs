//! Client status reports: download and deployment outcomes.
//!
//! Reports are advisory metrics, fire-and-forget from the client's point
//! of view: a malformed or unmatchable report is logged and acknowledged,
//! never failed back to the client.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use hotpush_db::repositories::package_repo::MetricKind;
use hotpush_db::repositories::{DeploymentRepo, PackageMetricsRepo, PackageRepo};

use crate::state::AppState;

/// Body of both report endpoints. Field names match the client protocol.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub deployment_key: String,
    pub label: String,
    pub client_unique_id: Option<String>,
    /// Deploy reports carry `"DeploymentSucceeded"` or `"DeploymentFailed"`.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /reportStatus/download
// ---------------------------------------------------------------------------

pub async fn report_download(
    State(state): State<AppState>,
    Json(report): Json<StatusReport>,
) -> &'static str {
    record(&state, &report, &[MetricKind::Downloaded]).await;
    "OK"
}

// ---------------------------------------------------------------------------
// POST /reportStatus/deploy
// ---------------------------------------------------------------------------

pub async fn report_deploy(
    State(state): State<AppState>,
    Json(report): Json<StatusReport>,
) -> &'static str {
    // A successful deploy also counts toward the active install base.
    let kinds: &[MetricKind] = match report.status.as_deref() {
        Some("DeploymentFailed") => &[MetricKind::Failed],
        _ => &[MetricKind::Installed, MetricKind::Active],
    };
    record(&state, &report, kinds).await;
    "OK"
}

/// Resolve the report to a package and bump the counters. All failure modes
/// are logged, none propagate.
async fn record(state: &AppState, report: &StatusReport, kinds: &[MetricKind]) {
    let deployment = match DeploymentRepo::find_by_key(&state.pool, &report.deployment_key).await
    {
        Ok(Some(deployment)) => deployment,
        Ok(None) => {
            tracing::info!(
                deployment_key = %report.deployment_key,
                "Status report for unknown deployment key"
            );
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "Status report lookup failed");
            return;
        }
    };

    let package =
        match PackageRepo::find_by_label(&state.pool, deployment.id, &report.label).await {
            Ok(Some(package)) => package,
            Ok(None) => {
                tracing::info!(
                    deployment_key = %report.deployment_key,
                    label = %report.label,
                    "Status report for unknown label"
                );
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Status report lookup failed");
                return;
            }
        };

    for kind in kinds {
        if let Err(e) = PackageMetricsRepo::increment(&state.pool, package.id, *kind).await {
            tracing::error!(error = %e, package_id = package.id, "Metric increment failed");
        }
    }
}
