//! Catalog provider contract.
//!
//! The engine never talks to a database directly; whoever owns the release
//! catalog implements [`Catalog`] and hands it to the resolver. The db
//! crate provides the PostgreSQL implementation.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::release::Release;

/// Read access to a deployment's ordered release history.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Releases for `deployment_key`, most recent label first.
    ///
    /// Returns `Ok(None)` when the deployment key is unknown -- the
    /// resolver turns that into [`CoreError::NotFound`] so an invalid key
    /// is never mistaken for "no update available". Backend failures map
    /// to [`CoreError::Internal`].
    async fn release_history(
        &self,
        deployment_key: &str,
    ) -> Result<Option<Vec<Release>>, CoreError>;
}
