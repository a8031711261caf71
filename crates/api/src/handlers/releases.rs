//! Release mutation: the two post-publish knobs (rollout percentage and
//! the disabled flag), plus per-release metrics.
//!
//! Every successful mutation invalidates the resolution cache for the
//! deployment before the response is sent, so later update checks observe
//! the new release set.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use hotpush_core::error::CoreError;
use hotpush_db::models::package::{Package, PackageMetrics, UpdatePackage};
use hotpush_db::repositories::{DeploymentRepo, PackageMetricsRepo, PackageRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PATCH /deployments/{key}/releases/{label}`.
#[derive(Debug, Deserialize)]
pub struct UpdateReleaseBody {
    pub rollout: Option<i16>,
    pub disabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up a package by deployment key and label.
async fn find_release(
    pool: &sqlx::PgPool,
    key: &str,
    label: &str,
) -> AppResult<Package> {
    let deployment = DeploymentRepo::find_by_key(pool, key)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::deployment_not_found(key)))?;

    PackageRepo::find_by_label(pool, deployment.id, label)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Release",
                id: label.to_string(),
            })
        })
}

// ---------------------------------------------------------------------------
// PATCH /deployments/{key}/releases/{label}
// ---------------------------------------------------------------------------

pub async fn update_release(
    State(state): State<AppState>,
    Path((key, label)): Path<(String, String)>,
    Json(body): Json<UpdateReleaseBody>,
) -> AppResult<Json<DataResponse<Package>>> {
    if let Some(rollout) = body.rollout {
        if !(0..=100).contains(&rollout) {
            return Err(AppError::BadRequest(format!(
                "rollout must be between 0 and 100, got {rollout}"
            )));
        }
    }
    if body.rollout.is_none() && body.disabled.is_none() {
        return Err(AppError::BadRequest(
            "nothing to update: provide rollout and/or disabled".to_string(),
        ));
    }

    let package = find_release(&state.pool, &key, &label).await?;

    let input = UpdatePackage {
        rollout: body.rollout,
        disabled: body.disabled,
    };
    let updated = PackageRepo::update(&state.pool, package.id, &input)
        .await?
        .ok_or_else(|| AppError::InternalError("release vanished during update".to_string()))?;

    // The release set changed: cached candidates for this deployment are
    // stale from this point on. In-flight resolutions may still complete
    // against the prior snapshot.
    let removed = state.cache.invalidate_deployment(&key);
    tracing::info!(
        deployment_key = %key,
        label = %label,
        rollout = ?updated.rollout,
        disabled = updated.disabled,
        cache_entries_invalidated = removed,
        "Release updated"
    );

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// GET /deployments/{key}/releases/{label}/metrics
// ---------------------------------------------------------------------------

pub async fn release_metrics(
    State(state): State<AppState>,
    Path((key, label)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<PackageMetrics>>> {
    let package = find_release(&state.pool, &key, &label).await?;

    let metrics = PackageMetricsRepo::find(&state.pool, package.id)
        .await?
        .unwrap_or(PackageMetrics {
            package_id: package.id,
            active: 0,
            downloaded: 0,
            installed: 0,
            failed: 0,
        });

    Ok(Json(DataResponse { data: metrics }))
}
