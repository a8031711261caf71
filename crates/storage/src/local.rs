//! Local-filesystem blob store.
//!
//! Objects live at `{root}/{first two fingerprint chars, lowercased}/{fingerprint}`.
//! The two-character shard keeps any single directory from accumulating
//! every blob on the server. Hidden files (leading dot) are ignored during
//! enumeration so editor droppings and `.gitkeep` files never show up as
//! orphans.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use hotpush_core::error::CoreError;
use hotpush_core::reconcile::BlobRecord;

use crate::BlobStore;

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sharded path for an identifier.
    fn blob_path(&self, hash: &str) -> PathBuf {
        let shard: String = hash.chars().take(2).collect::<String>().to_lowercase();
        self.root.join(shard).join(hash)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, hash: &str, content: &[u8]) -> Result<(), CoreError> {
        validate_identifier(hash)?;
        let path = self.blob_path(hash);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(hash, "Blob already stored, skipping write");
            return Ok(());
        }

        let parent = path.parent().expect("blob path always has a parent");
        tokio::fs::create_dir_all(parent).await?;

        // Write to a temporary name and rename so a crashed write never
        // leaves a half-blob under a valid identifier.
        let tmp = parent.join(format!(".{hash}.tmp"));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read(&self, hash: &str) -> Result<Vec<u8>, CoreError> {
        validate_identifier(hash)?;
        let path = self.blob_path(hash);
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::NotFound {
                entity: "Blob",
                id: hash.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &str) -> Result<bool, CoreError> {
        validate_identifier(hash)?;
        Ok(tokio::fs::try_exists(self.blob_path(hash)).await?)
    }

    async fn enumerate(&self) -> Result<Vec<BlobRecord>, CoreError> {
        let root = self.root.clone();
        // One full walk per call; blocking filesystem traversal stays off
        // the async worker threads.
        tokio::task::spawn_blocking(move || walk_store(&root))
            .await
            .map_err(|e| CoreError::StoreUnavailable(format!("enumeration task failed: {e}")))?
    }
}

/// Recursively collect every non-hidden file under `root`.
fn walk_store(root: &Path) -> Result<Vec<BlobRecord>, CoreError> {
    if !root.exists() {
        return Err(CoreError::StoreUnavailable(format!(
            "storage directory does not exist: {}",
            root.display()
        )));
    }

    let mut records = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            CoreError::StoreUnavailable(format!("cannot read {}: {e}", dir.display()))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                CoreError::StoreUnavailable(format!("cannot read {}: {e}", dir.display()))
            })?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            let metadata = entry.metadata().map_err(|e| {
                CoreError::StoreUnavailable(format!("cannot stat {}: {e}", path.display()))
            })?;

            if metadata.is_dir() {
                pending.push(path);
            } else {
                let modified_at = metadata
                    .modified()
                    .map(chrono::DateTime::<chrono::Utc>::from)
                    .unwrap_or_else(|_| chrono::Utc::now());
                records.push(BlobRecord {
                    hash: name.to_string_lossy().into_owned(),
                    size: metadata.len() as i64,
                    location: path.to_string_lossy().into_owned(),
                    modified_at,
                });
            }
        }
    }

    // Deterministic listing regardless of directory iteration order.
    records.sort_by(|a, b| a.hash.cmp(&b.hash));
    Ok(records)
}

/// Reject identifiers that could escape the store root.
fn validate_identifier(hash: &str) -> Result<(), CoreError> {
    if hash.len() < 2
        || hash
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '=')
    {
        return Err(CoreError::Validation(format!(
            "invalid blob identifier: '{hash}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
