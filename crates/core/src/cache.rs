//! Resolution cache: memoizes the deployment-wide candidate per distinct
//! request shape.
//!
//! The cache key deliberately excludes the client identity: the cached
//! value is everything about a resolution that is shared between clients
//! (the best eligible release for a given app version / last label / last
//! hash), while rollout inclusion is evaluated fresh on every request.
//! Memoizing the rollout decision under a shared key would leak one
//! client's cohort assignment to the whole fleet.
//!
//! Entries are pure memoization over a catalog scan, never a source of
//! truth: any catalog mutation (publish, rollout change, disable toggle)
//! invalidates every entry for that deployment. Resolutions already in
//! flight may complete against the prior snapshot.
//!
//! Concurrent lookups of the same key are single-flighted: one caller runs
//! the catalog scan, the rest await its result on a shared `OnceCell`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::error::CoreError;
use crate::release::Release;

/// Cache key: every request field that shapes the shared candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub deployment_key: String,
    pub app_version: String,
    pub client_label: Option<String>,
    pub client_package_hash: Option<String>,
}

/// The shared (client-independent) part of a resolution.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    /// Best eligible release for the request shape, ignoring rollout.
    /// `None` when nothing in the history matches the client version.
    pub candidate: Option<Release>,
    /// Whether the hash the client reported exists anywhere in the
    /// deployment's history. When it does not, the client is running
    /// content the channel no longer ships.
    pub client_hash_known: bool,
}

type Slot = Arc<OnceCell<Arc<CandidateEntry>>>;

/// Shared, explicitly owned resolution cache.
///
/// Passed by handle into the resolver; nothing in the engine reaches for
/// it as ambient state, so multiple independent deployments (or tests) can
/// each own their own instance.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<CacheKey, Slot>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `key`, loading it with `load` on a miss.
    ///
    /// Only one `load` runs per key at a time; concurrent callers wait for
    /// it and share the result. A failed load caches nothing, so the next
    /// caller retries.
    pub async fn get_or_load<F, Fut>(
        &self,
        key: &CacheKey,
        load: F,
    ) -> Result<Arc<CandidateEntry>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CandidateEntry, CoreError>>,
    {
        let slot = {
            let mut entries = self.entries.lock().expect("resolution cache poisoned");
            entries.entry(key.clone()).or_default().clone()
        };

        // The map lock is released before awaiting: the scan must not block
        // lookups of other keys.
        slot.get_or_try_init(|| async { load().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Drop every cached entry belonging to `deployment_key`.
    ///
    /// Called whenever the deployment's release set changes. Returns the
    /// number of entries removed.
    pub fn invalidate_deployment(&self, deployment_key: &str) -> usize {
        let mut entries = self.entries.lock().expect("resolution cache poisoned");
        let before = entries.len();
        entries.retain(|key, _| key.deployment_key != deployment_key);
        before - entries.len()
    }

    /// Number of cached request shapes (including in-flight loads).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("resolution cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
