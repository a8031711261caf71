//! Deployment (update channel) model.

use serde::Serialize;
use sqlx::FromRow;

use hotpush_core::types::{DbId, Timestamp};

/// A row from the `deployments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deployment {
    pub id: DbId,
    pub name: String,
    /// Opaque key clients present on update checks.
    pub key: String,
    pub created_at: Timestamp,
}
