//! Engine error taxonomy.
//!
//! Four kinds matter to callers: an unknown deployment key (`NotFound`),
//! a malformed record on an otherwise healthy catalog (`DataIntegrity`,
//! recovered locally), an unreadable content stream (`Io`), and a blob
//! store that cannot be enumerated (`StoreUnavailable`, aborts an audit).
//! `Validation` and `Internal` cover boundary and infrastructure faults.

use thiserror::Error;

/// Domain-level error type for the update engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// A stored record is malformed (e.g. an unparseable target-version
    /// constraint). Recovered locally where possible; never fatal to a
    /// whole deployment's resolution.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A content stream could not be fully read during fingerprinting.
    /// Propagated unchanged; retry policy is the caller's concern.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob store could not be enumerated. A partial audit report
    /// would misrepresent completeness, so the whole audit aborts.
    #[error("Blob store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid input rejected at a boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An unexpected infrastructure failure (e.g. catalog backend down).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for an unknown deployment key.
    pub fn deployment_not_found(key: &str) -> Self {
        CoreError::NotFound {
            entity: "Deployment",
            id: key.to_string(),
        }
    }
}
