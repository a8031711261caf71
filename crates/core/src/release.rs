//! Release domain types as the engine sees them.
//!
//! A [`Release`] is one published package revision in a deployment's
//! history. Identity (label + content hash) is immutable once published;
//! only the rollout percentage and the disabled flag may change afterward.

use serde::Serialize;

use crate::types::Timestamp;

/// One published package revision within a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    /// Monotonic per-deployment label, e.g. `"v3"`. Ordering within a
    /// deployment is total and strictly increasing.
    pub label: String,
    /// Content fingerprint of the update payload.
    pub package_hash: String,
    /// Content fingerprint of the optional file manifest.
    pub manifest_hash: Option<String>,
    /// Payload size in bytes.
    pub size: i64,
    /// Target-version constraint (exact version or semver range).
    pub target_version: String,
    /// Rollout percentage, 0-100. `None` means never limited (100).
    pub rollout: Option<u8>,
    /// Disabled releases are skipped during resolution.
    pub disabled: bool,
    /// Clients must install mandatory releases before continuing.
    pub mandatory: bool,
    /// Free-form release notes.
    pub description: String,
    pub created_at: Timestamp,
}

impl Release {
    /// The identity string fed to the rollout bucketer. The content hash is
    /// used rather than the label so re-publishing the same label in a new
    /// deployment never reuses cohort assignments.
    pub fn rollout_identity(&self) -> &str {
        &self.package_hash
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A release with sensible defaults for engine tests.
    pub fn release(label: &str, hash: &str, target: &str) -> Release {
        Release {
            label: label.to_string(),
            package_hash: hash.to_string(),
            manifest_hash: None,
            size: 1024,
            target_version: target.to_string(),
            rollout: None,
            disabled: false,
            mandatory: false,
            description: String::new(),
            created_at: chrono::Utc::now(),
        }
    }
}
