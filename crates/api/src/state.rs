use std::sync::Arc;

use hotpush_core::cache::ResolutionCache;
use hotpush_core::resolver::UpdateResolver;
use hotpush_storage::BlobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hotpush_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The resolution engine (owns the injected catalog handle).
    pub resolver: Arc<UpdateResolver>,
    /// Resolution cache; invalidated by release-mutation handlers.
    pub cache: Arc<ResolutionCache>,
    /// Blob store audited by the storage reconciler.
    pub blob_store: Arc<dyn BlobStore>,
}
