//! Linkage error types.

use legalops_core::LinkageId;
use legalops_remote::ApiError;
use thiserror::Error;

/// Failure of a linkage operation. Always surfaced to the caller.
#[derive(Debug, Error)]
pub enum LinkageError {
    /// The remote service did not persist the edge.
    #[error("failed to create linkage: {0}")]
    Write(#[source] ApiError),

    /// The remote service did not delete the edge (including unknown ids).
    #[error("failed to remove linkage {id}: {source}")]
    Delete {
        /// Edge that was to be removed.
        id: LinkageId,
        /// Remote failure.
        #[source]
        source: ApiError,
    },

    /// The remote service could not be queried.
    #[error("failed to fetch linkages: {0}")]
    Fetch(#[source] ApiError),
}

/// Result alias for linkage operations.
pub type Result<T> = std::result::Result<T, LinkageError>;
