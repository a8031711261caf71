//! Update resolution & staged rollout engine.
//!
//! This crate holds every decision the update server makes: which release
//! (if any) a requesting client should receive, whether that client is
//! inside a release's rollout cohort, how payload blobs are named, and
//! whether the persisted catalog and the blob store agree with each other.
//!
//! It performs no network or database I/O of its own -- the catalog is
//! injected behind [`catalog::Catalog`] and the reconciler works over
//! plain snapshots, so the engine can be exercised in isolation.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod fingerprint;
pub mod reconcile;
pub mod release;
pub mod resolver;
pub mod rollout;
pub mod types;
pub mod version;
