//! Error taxonomy for the substrate engine (spec.md §7).
//!
//! Errors bubble up as this tagged enum inside the core; the ABI boundary
//! (`substrate-abi`) is the only place that converts them into a boolean
//! plus a thread-local message. No error unwinds across that boundary.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-visible error kinds. Messages are human-readable, not API.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed UTF-8, unknown codepoint, zero-length/oversized buffer,
    /// out-of-range configuration, or a hex parse failure.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A write was attempted against the sealed Atom foundation.
    #[error("atom foundation is sealed")]
    SealedFoundation,

    /// A hash, codepoint, or id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient concurrency conflict. Retryable; the engine does not
    /// auto-retry.
    #[error("conflict (retryable): {0}")]
    Conflict(String),

    /// The host store reported an I/O or constraint error. Fatal for the
    /// current transaction.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// A cancellation token was observed.
    #[error("cancelled")]
    Cancelled,

    /// Invariant violation (e.g. a non-unit centroid was observed).
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageFailure(e.to_string())
    }
}

impl Error {
    /// Whether a caller may reasonably retry the operation unmodified.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
