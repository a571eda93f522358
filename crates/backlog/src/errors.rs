//! Error types for the backlog import domain.
//!
//! [`TrackerError`] is what any [`crate::IssueTracker`] operation can fail
//! with. Reconciliation recovers from [`TrackerError::Conflict`]; every other
//! variant is logged and isolated to the unit of work that produced it.
//!
//! [`ImportError`] covers conditions raised by the domain itself: a record
//! whose epic cannot be resolved, or a catalog that fails validation.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote errors
// ---------------------------------------------------------------------------

/// Failure of a single remote tracker operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The object being created already exists on the remote.
    #[error("{resource} already exists")]
    Conflict {
        /// Human-readable description of the conflicting object.
        resource: String,
    },

    /// The requested object does not exist (or is not visible to the caller).
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable description of the missing object.
        resource: String,
    },

    /// The credential was rejected or lacks the required permission.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Message returned by the remote.
        message: String,
    },

    /// The remote refused the request because a rate limit was reached.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message returned by the remote.
        message: String,
    },

    /// The remote rejected the payload for a reason other than a conflict.
    #[error("validation failed: {message}")]
    Validation {
        /// Message returned by the remote.
        message: String,
    },

    /// Any other unsuccessful response.
    #[error("remote returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message returned by the remote.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A response arrived but its body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl TrackerError {
    /// Returns `true` if the error means "the object already exists".
    ///
    /// This is the conflict classifier used by [`crate::reconcile`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Errors raised by the import domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A record references configuration that does not exist or was never
    /// resolved (e.g. an epic key absent from the catalog).
    ///
    /// Counted as a per-record failure; the run continues.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A remote operation failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The taxonomy catalog could not be parsed or is internally inconsistent.
    ///
    /// Produced at load time; a run never starts with an invalid catalog.
    #[error("invalid catalog: {message}")]
    Catalog {
        /// Description of the catalog problem.
        message: String,
    },
}
