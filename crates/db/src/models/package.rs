//! Package (published release) and metrics models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hotpush_core::release::Release;
use hotpush_core::types::{DbId, Timestamp};

/// A row from the `packages` table: one published release in a deployment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Package {
    pub id: DbId,
    pub deployment_id: DbId,
    pub label: String,
    pub package_hash: String,
    pub manifest_hash: Option<String>,
    pub size: i64,
    pub target_version: String,
    /// 0-100; NULL means never limited.
    pub rollout: Option<i16>,
    pub disabled: bool,
    pub mandatory: bool,
    pub description: String,
    pub created_at: Timestamp,
}

impl From<Package> for Release {
    fn from(row: Package) -> Self {
        Release {
            label: row.label,
            package_hash: row.package_hash,
            manifest_hash: row.manifest_hash,
            size: row.size,
            target_version: row.target_version,
            // The check constraint keeps rollout in 0..=100.
            rollout: row.rollout.map(|r| r.clamp(0, 100) as u8),
            disabled: row.disabled,
            mandatory: row.mandatory,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// DTO for the only mutations a published release allows: rollout
/// percentage and the disabled flag. Identity fields are immutable.
#[derive(Debug, Deserialize)]
pub struct UpdatePackage {
    pub rollout: Option<i16>,
    pub disabled: Option<bool>,
}

/// A row from the `package_metrics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PackageMetrics {
    pub package_id: DbId,
    pub active: i64,
    pub downloaded: i64,
    pub installed: i64,
    pub failed: i64,
}
