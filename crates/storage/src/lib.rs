//! Blob store abstraction and backends.
//!
//! Blobs are immutable objects named by their content fingerprint. The
//! store contract is deliberately small: write-once store-by-identifier,
//! read-by-identifier, and a full enumeration with per-object size and
//! modification time (the reconciler's view of physical reality).

use async_trait::async_trait;

use hotpush_core::error::CoreError;
use hotpush_core::reconcile::BlobRecord;

pub mod local;

pub use local::LocalBlobStore;

/// A content-addressed object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under `hash`. Write-once: storing an identifier that
    /// already exists is a no-op (the content is the same by construction).
    async fn put(&self, hash: &str, content: &[u8]) -> Result<(), CoreError>;

    /// Read a blob's content by identifier.
    async fn read(&self, hash: &str) -> Result<Vec<u8>, CoreError>;

    /// Whether a blob exists.
    async fn exists(&self, hash: &str) -> Result<bool, CoreError>;

    /// Enumerate every stored blob with its size and modification time.
    ///
    /// Fails with [`CoreError::StoreUnavailable`] when the store cannot be
    /// walked; a partial listing is never returned.
    async fn enumerate(&self) -> Result<Vec<BlobRecord>, CoreError>;
}
