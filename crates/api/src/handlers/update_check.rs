//! The update-check endpoint: the client side of the resolution engine.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use hotpush_core::resolver::{ClientUpdateRequest, ResolutionOutcome};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Query parameters of `GET /updateCheck`. Field names match the existing
/// client protocol.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckQuery {
    #[validate(length(min = 1, message = "deploymentKey is required"))]
    pub deployment_key: String,
    #[validate(length(min = 1, message = "appVersion is required"))]
    pub app_version: String,
    pub label: Option<String>,
    pub package_hash: Option<String>,
    #[validate(length(min = 1, message = "clientUniqueId is required"))]
    pub client_unique_id: String,
}

/// The `updateInfo` object clients consume.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub is_available: bool,
    pub is_mandatory: bool,
    pub label: Option<String>,
    pub package_hash: Option<String>,
    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
    #[serde(rename = "manifestURL")]
    pub manifest_url: Option<String>,
    pub package_size: i64,
    pub description: String,
    pub target_binary_range: String,
    pub should_run_binary_version: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckResponse {
    pub update_info: UpdateInfo,
}

// ---------------------------------------------------------------------------
// GET /updateCheck
// ---------------------------------------------------------------------------

/// Resolve the correct update (if any) for the requesting client.
///
/// 404 for an unknown deployment key; everything else -- already current,
/// nothing eligible, rollout suppression -- is a 200 with
/// `isAvailable: false`.
pub async fn update_check(
    State(state): State<AppState>,
    Query(params): Query<UpdateCheckQuery>,
) -> AppResult<Json<UpdateCheckResponse>> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Clients send empty strings for "no previous update".
    let request = ClientUpdateRequest {
        deployment_key: params.deployment_key,
        app_version: params.app_version,
        label: params.label.filter(|s| !s.is_empty()),
        package_hash: params.package_hash.filter(|s| !s.is_empty()),
        client_unique_id: params.client_unique_id,
    };

    let outcome = state.resolver.resolve(&request).await?;

    tracing::info!(
        deployment_key = %request.deployment_key,
        app_version = %request.app_version,
        is_available = outcome.is_available,
        label = outcome.label.as_deref().unwrap_or(""),
        "Update check resolved"
    );

    Ok(Json(UpdateCheckResponse {
        update_info: to_update_info(&state, outcome),
    }))
}

/// Turn an engine outcome into the wire shape, attaching download URLs.
fn to_update_info(state: &AppState, outcome: ResolutionOutcome) -> UpdateInfo {
    let download_url = outcome
        .download_ref
        .as_deref()
        .map(|r| state.config.download_url(r));
    let manifest_url = outcome
        .manifest_ref
        .as_deref()
        .map(|r| state.config.download_url(r));

    UpdateInfo {
        is_available: outcome.is_available,
        is_mandatory: outcome.is_mandatory,
        label: outcome.label,
        package_hash: outcome.package_hash,
        download_url,
        manifest_url,
        package_size: outcome.package_size,
        description: outcome.description,
        target_binary_range: outcome.target_binary_range,
        should_run_binary_version: outcome.should_run_binary_version,
    }
}
