//! Update resolution: "what package, if any, should this client receive?"
//!
//! Resolution splits into a shared half and a per-client half. The shared
//! half -- scanning the deployment's release history for the best eligible
//! release given the client's app version and reported state -- is
//! memoized in the [`ResolutionCache`]. The per-client half -- staged
//! rollout inclusion -- is evaluated fresh on every request, even on a
//! cache hit, so one client's cohort assignment never leaks to another.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheKey, CandidateEntry, ResolutionCache};
use crate::catalog::Catalog;
use crate::error::CoreError;
use crate::release::Release;
use crate::rollout;
use crate::version::{self, EmptyTargetPolicy};

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// One client's update-check request. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct ClientUpdateRequest {
    /// Opaque key identifying the deployment (update channel).
    pub deployment_key: String,
    /// The app version the client is currently running.
    pub app_version: String,
    /// Label of the last update the client applied, if any.
    pub label: Option<String>,
    /// Content hash of the last update the client applied, if any.
    pub package_hash: Option<String>,
    /// Stable client identifier used for rollout bucketing.
    pub client_unique_id: String,
}

/// What the client should do, as decided by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    /// Whether an update is available for this client.
    pub is_available: bool,
    /// Whether the available update must be installed before continuing.
    pub is_mandatory: bool,
    /// Label of the resolved release.
    pub label: Option<String>,
    /// Content hash of the resolved payload.
    pub package_hash: Option<String>,
    /// Blob identifier to download; the transport layer turns this into a
    /// URL. Same value as `package_hash` by construction.
    pub download_ref: Option<String>,
    /// Blob identifier of the resolved release's file manifest, if any.
    pub manifest_ref: Option<String>,
    /// Payload size in bytes (0 when no update is available).
    pub package_size: i64,
    /// Release notes.
    pub description: String,
    /// The resolved release's target-version constraint.
    pub target_binary_range: String,
    /// The client is running content this channel no longer ships and
    /// should fall back to its binary-bundled version.
    pub should_run_binary_version: bool,
}

impl ResolutionOutcome {
    /// Outcome for "nothing to ship" (already current, nothing eligible,
    /// or suppressed by staged rollout).
    fn not_available(should_run_binary_version: bool) -> Self {
        Self {
            is_available: false,
            is_mandatory: false,
            label: None,
            package_hash: None,
            download_ref: None,
            manifest_ref: None,
            package_size: 0,
            description: String::new(),
            target_binary_range: String::new(),
            should_run_binary_version,
        }
    }

    fn available(candidate: &Release) -> Self {
        Self {
            is_available: true,
            is_mandatory: candidate.mandatory,
            label: Some(candidate.label.clone()),
            package_hash: Some(candidate.package_hash.clone()),
            download_ref: Some(candidate.package_hash.clone()),
            manifest_ref: candidate.manifest_hash.clone(),
            package_size: candidate.size,
            description: candidate.description.clone(),
            target_binary_range: candidate.target_version.clone(),
            should_run_binary_version: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Orchestrates version matching, rollout bucketing, and the resolution
/// cache over an injected catalog.
pub struct UpdateResolver {
    catalog: Arc<dyn Catalog>,
    cache: Arc<ResolutionCache>,
    empty_target_policy: EmptyTargetPolicy,
}

impl UpdateResolver {
    pub fn new(catalog: Arc<dyn Catalog>, cache: Arc<ResolutionCache>) -> Self {
        Self {
            catalog,
            cache,
            empty_target_policy: EmptyTargetPolicy::default(),
        }
    }

    /// Override how releases with a missing/empty target constraint match.
    pub fn with_empty_target_policy(mut self, policy: EmptyTargetPolicy) -> Self {
        self.empty_target_policy = policy;
        self
    }

    /// Handle to the cache, for invalidation at catalog mutation sites.
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Resolve one client update-check request.
    ///
    /// Fails with [`CoreError::NotFound`] for an unknown deployment key;
    /// every other "nothing for you" case is a successful outcome with
    /// `is_available == false`.
    pub async fn resolve(
        &self,
        request: &ClientUpdateRequest,
    ) -> Result<ResolutionOutcome, CoreError> {
        let key = CacheKey {
            deployment_key: request.deployment_key.clone(),
            app_version: request.app_version.clone(),
            client_label: request.label.clone(),
            client_package_hash: request.package_hash.clone(),
        };

        let catalog = Arc::clone(&self.catalog);
        let policy = self.empty_target_policy;
        let req = request.clone();
        let entry = self
            .cache
            .get_or_load(&key, || async move {
                scan_history(catalog.as_ref(), &req, policy).await
            })
            .await?;

        Ok(self.outcome_for(request, &entry))
    }

    /// Per-client half: runs on every request, cache hit or miss.
    fn outcome_for(
        &self,
        request: &ClientUpdateRequest,
        entry: &CandidateEntry,
    ) -> ResolutionOutcome {
        let should_run_binary = !entry.client_hash_known;

        let Some(candidate) = &entry.candidate else {
            return ResolutionOutcome::not_available(should_run_binary);
        };

        // Already current: the client holds the candidate's exact content.
        if request.package_hash.as_deref() == Some(candidate.package_hash.as_str()) {
            return ResolutionOutcome::not_available(false);
        }

        // Staged rollout: deliberate suppression, not an error. Evaluated
        // here, per client, so it is never baked into the shared entry.
        if !rollout::is_included(
            &request.client_unique_id,
            candidate.rollout_identity(),
            candidate.rollout,
        ) {
            tracing::debug!(
                deployment_key = %request.deployment_key,
                label = %candidate.label,
                rollout = ?candidate.rollout,
                "Client outside rollout cohort"
            );
            return ResolutionOutcome::not_available(should_run_binary);
        }

        let mut outcome = ResolutionOutcome::available(candidate);
        outcome.should_run_binary_version = should_run_binary;
        outcome
    }
}

/// Shared half: scan the deployment's history for the best eligible
/// release, newest label first. Runs under the cache's single-flight
/// guard, at most once per request shape.
async fn scan_history(
    catalog: &dyn Catalog,
    request: &ClientUpdateRequest,
    policy: EmptyTargetPolicy,
) -> Result<CandidateEntry, CoreError> {
    let history = catalog
        .release_history(&request.deployment_key)
        .await?
        .ok_or_else(|| CoreError::deployment_not_found(&request.deployment_key))?;

    let mut candidate = None;
    for release in &history {
        if release.disabled {
            continue;
        }
        match version::matches(&request.app_version, &release.target_version, policy) {
            Ok(true) => {
                candidate = Some(release.clone());
                break;
            }
            Ok(false) => {}
            Err(err) => {
                // One malformed release must not block the deployment.
                tracing::warn!(
                    deployment_key = %request.deployment_key,
                    label = %release.label,
                    error = %err,
                    "Skipping release with unparseable target version constraint"
                );
            }
        }
    }

    // A client reporting no hash is on its binary-bundled version; only a
    // reported hash that the history does not contain signals stale content.
    let client_hash_known = match &request.package_hash {
        Some(hash) => history.iter().any(|r| r.package_hash == *hash),
        None => true,
    };

    Ok(CandidateEntry {
        candidate,
        client_hash_known,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::release::test_support::release;

    /// In-memory catalog with a scan counter.
    #[derive(Default)]
    struct MemCatalog {
        deployments: Mutex<HashMap<String, Vec<Release>>>,
        loads: AtomicUsize,
    }

    impl MemCatalog {
        fn with(key: &str, mut releases: Vec<Release>) -> Self {
            // Stored newest-first, matching the catalog contract.
            releases.reverse();
            let mut deployments = HashMap::new();
            deployments.insert(key.to_string(), releases);
            Self {
                deployments: Mutex::new(deployments),
                loads: AtomicUsize::new(0),
            }
        }

        fn publish(&self, key: &str, release: Release) {
            let mut deployments = self.deployments.lock().unwrap();
            deployments.get_mut(key).unwrap().insert(0, release);
        }
    }

    #[async_trait]
    impl Catalog for MemCatalog {
        async fn release_history(
            &self,
            deployment_key: &str,
        ) -> Result<Option<Vec<Release>>, CoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.deployments.lock().unwrap().get(deployment_key).cloned())
        }
    }

    fn resolver(catalog: MemCatalog) -> UpdateResolver {
        UpdateResolver::new(Arc::new(catalog), Arc::new(ResolutionCache::new()))
    }

    fn request(deployment: &str, version: &str, client: &str) -> ClientUpdateRequest {
        ClientUpdateRequest {
            deployment_key: deployment.to_string(),
            app_version: version.to_string(),
            label: None,
            package_hash: None,
            client_unique_id: client.to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_deployment_key_is_not_found() {
        let resolver = resolver(MemCatalog::default());
        let err = resolver
            .resolve(&request("no-such-key", "1.0.0", "alice"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Deployment", .. });
    }

    #[tokio::test]
    async fn picks_newest_eligible_release() {
        let catalog = MemCatalog::with(
            "dep",
            vec![
                release("v1", "hash-1", "1.0.0"),
                release("v2", "hash-2", "1.0.0"),
                release("v3", "hash-3", "2.0.0"), // wrong version
            ],
        );
        let outcome = resolver(catalog)
            .resolve(&request("dep", "1.0.0", "alice"))
            .await
            .unwrap();
        assert!(outcome.is_available);
        assert_eq!(outcome.label.as_deref(), Some("v2"));
        assert_eq!(outcome.package_hash.as_deref(), Some("hash-2"));
        assert_eq!(outcome.download_ref.as_deref(), Some("hash-2"));
    }

    #[tokio::test]
    async fn disabled_releases_are_skipped() {
        let mut newest = release("v2", "hash-2", "1.0.0");
        newest.disabled = true;
        let catalog =
            MemCatalog::with("dep", vec![release("v1", "hash-1", "1.0.0"), newest]);
        let outcome = resolver(catalog)
            .resolve(&request("dep", "1.0.0", "alice"))
            .await
            .unwrap();
        assert_eq!(outcome.label.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn malformed_constraint_skips_release_not_resolution() {
        let catalog = MemCatalog::with(
            "dep",
            vec![
                release("v1", "hash-1", "1.0.0"),
                release("v2", "hash-2", "!! broken !!"),
            ],
        );
        let outcome = resolver(catalog)
            .resolve(&request("dep", "1.0.0", "alice"))
            .await
            .unwrap();
        assert!(outcome.is_available);
        assert_eq!(outcome.label.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn client_already_current_gets_nothing() {
        let catalog = MemCatalog::with("dep", vec![release("v1", "hash-1", "1.0.0")]);
        let mut req = request("dep", "1.0.0", "alice");
        req.label = Some("v1".to_string());
        req.package_hash = Some("hash-1".to_string());

        let outcome = resolver(catalog).resolve(&req).await.unwrap();
        assert!(!outcome.is_available);
        assert!(!outcome.should_run_binary_version);
    }

    #[tokio::test]
    async fn no_matching_version_gets_nothing() {
        let catalog = MemCatalog::with("dep", vec![release("v1", "hash-1", "2.0.0")]);
        let outcome = resolver(catalog)
            .resolve(&request("dep", "1.0.0", "alice"))
            .await
            .unwrap();
        assert!(!outcome.is_available);
    }

    #[tokio::test]
    async fn unknown_client_hash_signals_binary_fallback() {
        let catalog = MemCatalog::with("dep", vec![release("v1", "hash-1", "2.0.0")]);
        let mut req = request("dep", "1.0.0", "alice");
        req.package_hash = Some("hash-gone".to_string());

        let outcome = resolver(catalog).resolve(&req).await.unwrap();
        assert!(!outcome.is_available);
        assert!(outcome.should_run_binary_version);
    }

    #[tokio::test]
    async fn zero_rollout_suppresses_for_everyone() {
        let mut rel = release("v1", "hash-1", "1.0.0");
        rel.rollout = Some(0);
        let resolver = resolver(MemCatalog::with("dep", vec![rel]));

        for client in ["alice", "bob", "carol"] {
            let outcome = resolver
                .resolve(&request("dep", "1.0.0", client))
                .await
                .unwrap();
            assert!(!outcome.is_available);
        }
    }

    #[tokio::test]
    async fn staged_rollout_is_deterministic_per_client() {
        // v1 fully rolled out, v2 at 50%: a given client either always gets
        // v2 or always gets nothing -- never a mix.
        let mut v2 = release("v2", "hash-2", "1.0.0");
        v2.rollout = Some(50);
        let catalog =
            MemCatalog::with("dep", vec![release("v1", "hash-1", "1.0.0"), v2]);
        let resolver = resolver(catalog);

        let mut req = request("dep", "1.0.0", "alice");
        req.label = Some("v1".to_string());
        req.package_hash = Some("hash-1".to_string());

        let first = resolver.resolve(&req).await.unwrap();
        let expected = rollout::is_included("alice", "hash-2", Some(50));
        assert_eq!(first.is_available, expected);
        if first.is_available {
            assert_eq!(first.label.as_deref(), Some("v2"));
        }
        for _ in 0..10 {
            let again = resolver.resolve(&req).await.unwrap();
            assert_eq!(again.is_available, first.is_available);
        }
    }

    #[tokio::test]
    async fn rollout_is_never_memoized_across_clients() {
        // Two clients sharing a cache key must share the candidate scan but
        // each get their own rollout decision.
        let mut rel = release("v1", "hash-1", "1.0.0");
        rel.rollout = Some(50);
        let catalog = MemCatalog::with("dep", vec![rel]);
        let resolver = UpdateResolver::new(
            Arc::new(catalog),
            Arc::new(ResolutionCache::new()),
        );

        // Find two clients with opposite bucketing outcomes.
        let included = (0..10_000)
            .map(|i| format!("client-{i}"))
            .find(|c| rollout::is_included(c, "hash-1", Some(50)))
            .unwrap();
        let excluded = (0..10_000)
            .map(|i| format!("client-{i}"))
            .find(|c| !rollout::is_included(c, "hash-1", Some(50)))
            .unwrap();

        let got_included = resolver
            .resolve(&request("dep", "1.0.0", &included))
            .await
            .unwrap();
        let got_excluded = resolver
            .resolve(&request("dep", "1.0.0", &excluded))
            .await
            .unwrap();

        assert!(got_included.is_available);
        assert!(!got_excluded.is_available);
    }

    #[tokio::test]
    async fn candidate_scan_is_cached_until_invalidated() {
        let catalog = Arc::new(MemCatalog::with(
            "dep",
            vec![release("v1", "hash-1", "1.0.0")],
        ));
        let cache = Arc::new(ResolutionCache::new());
        let resolver = UpdateResolver::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            Arc::clone(&cache),
        );

        let req = request("dep", "1.0.0", "alice");
        resolver.resolve(&req).await.unwrap();
        resolver.resolve(&req).await.unwrap();
        assert_eq!(catalog.loads.load(Ordering::SeqCst), 1);

        // Publish v2 and invalidate: the next resolution sees it.
        catalog.publish("dep", release("v2", "hash-2", "1.0.0"));
        cache.invalidate_deployment("dep");

        let outcome = resolver.resolve(&req).await.unwrap();
        assert_eq!(catalog.loads.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.label.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn stale_candidate_served_until_invalidation() {
        // Without invalidation the cache legitimately serves the prior
        // snapshot; it is a memoization layer, not a source of truth.
        let catalog = Arc::new(MemCatalog::with(
            "dep",
            vec![release("v1", "hash-1", "1.0.0")],
        ));
        let resolver = UpdateResolver::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            Arc::new(ResolutionCache::new()),
        );

        let req = request("dep", "1.0.0", "alice");
        resolver.resolve(&req).await.unwrap();
        catalog.publish("dep", release("v2", "hash-2", "1.0.0"));

        let outcome = resolver.resolve(&req).await.unwrap();
        assert_eq!(outcome.label.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn empty_constraint_policy_is_configurable() {
        let rel = release("v1", "hash-1", "");
        let catalog = MemCatalog::with("dep", vec![rel.clone()]);
        let outcome = resolver(catalog)
            .resolve(&request("dep", "9.9.9", "alice"))
            .await
            .unwrap();
        assert!(outcome.is_available, "MatchAny is the default");

        let catalog = MemCatalog::with("dep", vec![rel]);
        let strict = UpdateResolver::new(
            Arc::new(catalog),
            Arc::new(ResolutionCache::new()),
        )
        .with_empty_target_policy(EmptyTargetPolicy::MatchNone);
        let outcome = strict
            .resolve(&request("dep", "9.9.9", "alice"))
            .await
            .unwrap();
        assert!(!outcome.is_available);
    }
}
