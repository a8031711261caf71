//! Repository for deployments (update channels).

use sqlx::PgPool;

use crate::models::deployment::Deployment;

/// Column list for `deployments` queries.
const DEPLOYMENT_COLUMNS: &str = "id, name, key, created_at";

/// Read access to deployments. Channel CRUD is owned by the admin surface,
/// not this service.
pub struct DeploymentRepo;

impl DeploymentRepo {
    /// Find a deployment by its client-facing key.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!("SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE key = $1");
        sqlx::query_as::<_, Deployment>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// List all deployments ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Deployment>, sqlx::Error> {
        let query = format!("SELECT {DEPLOYMENT_COLUMNS} FROM deployments ORDER BY name ASC");
        sqlx::query_as::<_, Deployment>(&query).fetch_all(pool).await
    }
}
