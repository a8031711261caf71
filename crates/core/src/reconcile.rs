//! Storage reconciliation: drift detection between the release catalog and
//! the blob store.
//!
//! The catalog names the blobs that must exist (every payload and manifest
//! fingerprint); the store is what physically exists. The audit joins the
//! two sets on the content fingerprint and classifies each identifier as
//! valid, missing (catalog references it, store lacks it), or orphaned
//! (store has it, nothing references it). Purely diagnostic: nothing is
//! mutated, and running it twice over unchanged inputs yields the same
//! report.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::release::Release;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Snapshot and report types
// ---------------------------------------------------------------------------

/// One physical object in the blob store, named by its fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct BlobRecord {
    /// Content fingerprint (also the object's name in the store).
    pub hash: String,
    pub size: i64,
    /// Store-specific location, e.g. a filesystem path.
    pub location: String,
    pub modified_at: Timestamp,
}

/// Which reference on a release a blob backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    Payload,
    Manifest,
}

/// A blob present in both the catalog and the store.
#[derive(Debug, Clone, Serialize)]
pub struct ValidBlob {
    pub label: String,
    pub kind: BlobKind,
    pub hash: String,
    pub size: i64,
    pub location: String,
}

/// A blob the catalog references but the store lacks.
#[derive(Debug, Clone, Serialize)]
pub struct MissingBlob {
    /// Owning release's label, for remediation.
    pub label: String,
    pub kind: BlobKind,
    pub hash: String,
}

/// A blob in the store that no release references.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanedBlob {
    pub hash: String,
    pub size: i64,
    pub location: String,
    pub modified_at: Timestamp,
}

/// Counts and aggregate sizes for a [`ReconciliationReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationSummary {
    pub blobs_in_store: usize,
    pub bytes_in_store: i64,
    pub references_in_catalog: usize,
    pub valid_count: usize,
    pub valid_bytes: i64,
    pub missing_count: usize,
    pub orphaned_count: usize,
    pub orphaned_bytes: i64,
}

/// Output of one audit run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub summary: ReconciliationSummary,
    pub valid: Vec<ValidBlob>,
    pub missing: Vec<MissingBlob>,
    pub orphaned: Vec<OrphanedBlob>,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Cross-check a catalog snapshot against a blob store snapshot.
///
/// The two snapshots need not be transactionally consistent with each
/// other; classifications are best-effort as of each side's read time.
/// Output ordering is deterministic (catalog order for valid/missing,
/// fingerprint order for orphans) so identical inputs produce identical
/// reports.
pub fn audit(catalog: &[Release], store: &[BlobRecord]) -> ReconciliationReport {
    // One store enumeration: fingerprint -> metadata. BTreeMap keeps the
    // orphan listing deterministically ordered.
    let mut store_map: BTreeMap<&str, &BlobRecord> = BTreeMap::new();
    let mut bytes_in_store: i64 = 0;
    for record in store {
        bytes_in_store += record.size;
        store_map.insert(record.hash.as_str(), record);
    }
    let blobs_in_store = store_map.len();

    // Every non-empty payload or manifest reference, in catalog order.
    let mut references: Vec<(&str, BlobKind, &str)> = Vec::new();
    for release in catalog {
        if !release.package_hash.is_empty() {
            references.push((&release.label, BlobKind::Payload, &release.package_hash));
        }
        if let Some(manifest) = release.manifest_hash.as_deref() {
            if !manifest.is_empty() {
                references.push((&release.label, BlobKind::Manifest, manifest));
            }
        }
    }

    let mut valid = Vec::new();
    let mut missing = Vec::new();
    let mut expected: HashSet<&str> = HashSet::new();

    for &(label, kind, hash) in &references {
        expected.insert(hash);
        match store_map.get(hash) {
            Some(record) => valid.push(ValidBlob {
                label: label.to_string(),
                kind,
                hash: hash.to_string(),
                size: record.size,
                location: record.location.clone(),
            }),
            None => missing.push(MissingBlob {
                label: label.to_string(),
                kind,
                hash: hash.to_string(),
            }),
        }
    }

    let orphaned: Vec<OrphanedBlob> = store_map
        .values()
        .filter(|record| !expected.contains(record.hash.as_str()))
        .map(|record| OrphanedBlob {
            hash: record.hash.clone(),
            size: record.size,
            location: record.location.clone(),
            modified_at: record.modified_at,
        })
        .collect();

    let summary = ReconciliationSummary {
        blobs_in_store,
        bytes_in_store,
        references_in_catalog: expected.len(),
        valid_count: valid.len(),
        valid_bytes: valid.iter().map(|v| v.size).sum(),
        missing_count: missing.len(),
        orphaned_count: orphaned.len(),
        orphaned_bytes: orphaned.iter().map(|o| o.size).sum(),
    };

    ReconciliationReport {
        summary,
        valid,
        missing,
        orphaned,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::test_support::release;

    fn blob(hash: &str, size: i64) -> BlobRecord {
        BlobRecord {
            hash: hash.to_string(),
            size,
            location: format!("/store/{}/{hash}", &hash[..2].to_lowercase()),
            modified_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn classifies_valid_missing_and_orphaned() {
        // Catalog references {A, B}; store holds {A, C}.
        let catalog = vec![release("v1", "AA-hash", "1.0.0"), release("v2", "BB-hash", "1.0.0")];
        let store = vec![blob("AA-hash", 100), blob("CC-hash", 300)];

        let report = audit(&catalog, &store);

        assert_eq!(report.summary.valid_count, 1);
        assert_eq!(report.valid[0].hash, "AA-hash");
        assert_eq!(report.valid[0].label, "v1");
        assert_eq!(report.valid[0].kind, BlobKind::Payload);

        assert_eq!(report.summary.missing_count, 1);
        assert_eq!(report.missing[0].hash, "BB-hash");
        assert_eq!(report.missing[0].label, "v2");

        assert_eq!(report.summary.orphaned_count, 1);
        assert_eq!(report.orphaned[0].hash, "CC-hash");
        assert_eq!(report.summary.orphaned_bytes, 300);
    }

    #[test]
    fn manifests_are_expected_too() {
        let mut rel = release("v1", "AA-hash", "1.0.0");
        rel.manifest_hash = Some("MM-hash".to_string());
        let store = vec![blob("AA-hash", 100)];

        let report = audit(&[rel], &store);

        assert_eq!(report.summary.missing_count, 1);
        assert_eq!(report.missing[0].kind, BlobKind::Manifest);
        assert_eq!(report.missing[0].label, "v1");
        // The manifest blob is expected, so it must not appear as orphaned.
        assert_eq!(report.summary.orphaned_count, 0);
    }

    #[test]
    fn empty_references_are_ignored() {
        let mut rel = release("v1", "", "1.0.0");
        rel.manifest_hash = Some(String::new());
        let report = audit(&[rel], &[]);
        assert_eq!(report.summary.references_in_catalog, 0);
        assert_eq!(report.summary.missing_count, 0);
    }

    #[test]
    fn shared_blob_across_releases_is_not_orphaned() {
        // Two releases can reference the same payload (re-publish).
        let catalog = vec![release("v1", "AA-hash", "1.0.0"), release("v2", "AA-hash", "1.0.0")];
        let store = vec![blob("AA-hash", 100)];

        let report = audit(&catalog, &store);
        assert_eq!(report.summary.valid_count, 2); // one entry per reference
        assert_eq!(report.summary.references_in_catalog, 1); // distinct hashes
        assert_eq!(report.summary.orphaned_count, 0);
    }

    #[test]
    fn empty_catalog_makes_everything_orphaned() {
        let store = vec![blob("AA-hash", 10), blob("BB-hash", 20)];
        let report = audit(&[], &store);
        assert_eq!(report.summary.orphaned_count, 2);
        assert_eq!(report.summary.orphaned_bytes, 30);
        assert_eq!(report.summary.valid_count, 0);
        assert_eq!(report.summary.missing_count, 0);
    }

    #[test]
    fn audit_is_idempotent() {
        let mut rel = release("v1", "AA-hash", "1.0.0");
        rel.manifest_hash = Some("MM-hash".to_string());
        let catalog = vec![rel, release("v2", "BB-hash", "1.0.0")];
        let store = vec![blob("AA-hash", 100), blob("ZZ-hash", 50)];

        let first = audit(&catalog, &store);
        let second = audit(&catalog, &store);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn store_totals_cover_all_blobs() {
        let store = vec![blob("AA-hash", 1), blob("BB-hash", 2), blob("CC-hash", 3)];
        let report = audit(&[release("v1", "AA-hash", "1.0.0")], &store);
        assert_eq!(report.summary.blobs_in_store, 3);
        assert_eq!(report.summary.bytes_in_store, 6);
    }
}
