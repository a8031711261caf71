//! Content-addressable fingerprint for payload and manifest blobs.
//!
//! Blobs are hashed in 4 MiB blocks: each block gets an independent SHA-1
//! digest, and the identifier is `base64url(prefix ++ digest)` where the
//! digest is the single block's digest (prefix `0x16`) or the SHA-1 of all
//! block digests concatenated in order (prefix `0x96`). Empty input maps to
//! a fixed sentinel. Block-wise hashing bounds peak memory for large
//! payloads and lets the identifier be computed while streaming.
//!
//! Every stored blob is named by this identifier, so the encoding is a
//! compatibility surface: the prefix bytes, the sentinel, and the base64
//! alphabet substitutions must not change.

use std::io::Read;

use sha1::{Digest, Sha1};

/// Fingerprint of zero-length content.
pub const EMPTY_FINGERPRINT: &str = "Fto5o-5ea0sNMlW_75VgGJCv2AcJ";

/// Block size over which per-block digests are computed.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Prefix byte for identifiers derived from a single block.
const PREFIX_SINGLE: u8 = 0x16;

/// Prefix byte for identifiers derived from multiple blocks.
const PREFIX_MULTI: u8 = 0x96;

/// Read buffer size for [`fingerprint_reader`].
const READ_CHUNK: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Streaming hasher
// ---------------------------------------------------------------------------

/// Incremental fingerprint computation.
///
/// Feed content in arbitrary chunk sizes with [`update`](Self::update);
/// block boundaries are tracked internally, so the result is identical
/// regardless of how the input was split (chunking-invariance).
#[derive(Debug, Default)]
pub struct Fingerprinter {
    /// Concatenated 20-byte SHA-1 digests of completed blocks.
    block_digests: Vec<u8>,
    /// Hasher for the block currently being filled.
    current: Sha1,
    /// Bytes fed into `current` so far (always < BLOCK_SIZE after update).
    current_len: usize,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of content.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let remaining = BLOCK_SIZE - self.current_len;
            let take = remaining.min(data.len());
            self.current.update(&data[..take]);
            self.current_len += take;
            data = &data[take..];

            if self.current_len == BLOCK_SIZE {
                self.seal_block();
            }
        }
    }

    /// Finish the computation and return the identifier.
    pub fn finalize(mut self) -> String {
        if self.current_len > 0 {
            self.seal_block();
        }
        if self.block_digests.is_empty() {
            return EMPTY_FINGERPRINT.to_string();
        }

        let block_count = self.block_digests.len() / 20;
        let (prefix, digest) = if block_count == 1 {
            (PREFIX_SINGLE, self.block_digests)
        } else {
            (PREFIX_MULTI, Sha1::digest(&self.block_digests).to_vec())
        };

        let mut raw = Vec::with_capacity(digest.len() + 1);
        raw.push(prefix);
        raw.extend_from_slice(&digest);
        encode_identifier(&raw)
    }

    /// Close out the in-progress block and append its digest.
    fn seal_block(&mut self) {
        let hasher = std::mem::take(&mut self.current);
        self.block_digests.extend_from_slice(&hasher.finalize());
        self.current_len = 0;
    }
}

/// Standard base64 with `/` -> `_` and `+` -> `-`. Padding is kept.
fn encode_identifier(raw: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .encode(raw)
        .replace('/', "_")
        .replace('+', "-")
}

// ---------------------------------------------------------------------------
// Convenience entry points
// ---------------------------------------------------------------------------

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    let mut hasher = Fingerprinter::new();
    hasher.update(content);
    hasher.finalize()
}

/// Fingerprint a blocking reader, consuming it to EOF.
///
/// Reads in small chunks so the whole content is never buffered. Fails with
/// the underlying I/O error if the stream cannot be fully read.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Fingerprinter::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Fingerprint a file without blocking the async runtime.
pub async fn fingerprint_file(path: std::path::PathBuf) -> std::io::Result<String> {
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(path)?;
        fingerprint_reader(std::io::BufReader::new(file))
    })
    .await
    .map_err(|e| std::io::Error::other(format!("fingerprint task panicked: {e}")))?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
