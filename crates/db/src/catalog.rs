//! PostgreSQL implementation of the engine's catalog-provider trait.

use async_trait::async_trait;

use hotpush_core::catalog::Catalog;
use hotpush_core::error::CoreError;
use hotpush_core::release::Release;

use crate::repositories::{DeploymentRepo, PackageRepo};
use crate::DbPool;

/// Release catalog backed by the `deployments` / `packages` tables.
#[derive(Debug, Clone)]
pub struct SqlCatalog {
    pool: DbPool,
}

impl SqlCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for SqlCatalog {
    async fn release_history(
        &self,
        deployment_key: &str,
    ) -> Result<Option<Vec<Release>>, CoreError> {
        let deployment = DeploymentRepo::find_by_key(&self.pool, deployment_key)
            .await
            .map_err(internal)?;

        let Some(deployment) = deployment else {
            // Unknown key: the resolver maps this to NotFound.
            return Ok(None);
        };

        let packages = PackageRepo::list_by_deployment(&self.pool, deployment.id)
            .await
            .map_err(internal)?;

        Ok(Some(packages.into_iter().map(Release::from).collect()))
    }
}

/// Catalog backend failures are infrastructure faults, not domain errors.
fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Catalog query failed");
    CoreError::Internal(format!("catalog query failed: {err}"))
}
