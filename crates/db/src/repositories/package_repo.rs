//! Repositories for packages (published releases) and their metrics.

use sqlx::PgPool;

use hotpush_core::types::DbId;

use crate::models::package::{Package, PackageMetrics, UpdatePackage};

/// Column list for `packages` queries.
const PACKAGE_COLUMNS: &str = "\
    id, deployment_id, label, package_hash, manifest_hash, size, \
    target_version, rollout, disabled, mandatory, description, created_at";

/// Read and (narrowly) mutate published releases.
///
/// Release identity is immutable once published; the only updatable fields
/// are the rollout percentage and the disabled flag.
pub struct PackageRepo;

impl PackageRepo {
    /// All releases of a deployment, most recent label first.
    ///
    /// Labels are assigned in publish order, so `id` descending is the
    /// label ordering.
    pub async fn list_by_deployment(
        pool: &PgPool,
        deployment_id: DbId,
    ) -> Result<Vec<Package>, sqlx::Error> {
        let query = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages \
             WHERE deployment_id = $1 ORDER BY id DESC"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(deployment_id)
            .fetch_all(pool)
            .await
    }

    /// Find one release by deployment and label.
    pub async fn find_by_label(
        pool: &PgPool,
        deployment_id: DbId,
        label: &str,
    ) -> Result<Option<Package>, sqlx::Error> {
        let query = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages \
             WHERE deployment_id = $1 AND label = $2"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(deployment_id)
            .bind(label)
            .fetch_optional(pool)
            .await
    }

    /// Every package across all deployments (the reconciler's catalog scan).
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Package>, sqlx::Error> {
        let query = format!("SELECT {PACKAGE_COLUMNS} FROM packages ORDER BY id ASC");
        sqlx::query_as::<_, Package>(&query).fetch_all(pool).await
    }

    /// Apply the allowed post-publish mutations. Only non-`None` fields in
    /// `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePackage,
    ) -> Result<Option<Package>, sqlx::Error> {
        let query = format!(
            "UPDATE packages SET \
                rollout = COALESCE($2, rollout), \
                disabled = COALESCE($3, disabled) \
             WHERE id = $1 \
             RETURNING {PACKAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(id)
            .bind(input.rollout)
            .bind(input.disabled)
            .fetch_optional(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// PackageMetricsRepo
// ---------------------------------------------------------------------------

/// Per-release client status counters.
pub struct PackageMetricsRepo;

/// A counter column on `package_metrics`.
#[derive(Debug, Clone, Copy)]
pub enum MetricKind {
    Active,
    Downloaded,
    Installed,
    Failed,
}

impl MetricKind {
    fn column(self) -> &'static str {
        match self {
            MetricKind::Active => "active",
            MetricKind::Downloaded => "downloaded",
            MetricKind::Installed => "installed",
            MetricKind::Failed => "failed",
        }
    }
}

impl PackageMetricsRepo {
    /// Increment one counter, creating the metrics row on first report.
    pub async fn increment(
        pool: &PgPool,
        package_id: DbId,
        kind: MetricKind,
    ) -> Result<(), sqlx::Error> {
        let column = kind.column();
        let query = format!(
            "INSERT INTO package_metrics (package_id, {column}) VALUES ($1, 1) \
             ON CONFLICT (package_id) DO UPDATE SET {column} = package_metrics.{column} + 1"
        );
        sqlx::query(&query).bind(package_id).execute(pool).await?;
        Ok(())
    }

    /// Fetch counters for one release.
    pub async fn find(
        pool: &PgPool,
        package_id: DbId,
    ) -> Result<Option<PackageMetrics>, sqlx::Error> {
        sqlx::query_as::<_, PackageMetrics>(
            "SELECT package_id, active, downloaded, installed, failed \
             FROM package_metrics WHERE package_id = $1",
        )
        .bind(package_id)
        .fetch_optional(pool)
        .await
    }
}
