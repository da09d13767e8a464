//! Error taxonomy for token issuance and stream resolution.

use thiserror::Error;

/// Errors surfaced by the token engine and stream policy
#[derive(Debug, Error)]
pub enum StreamError {
    /// Caller supplied structurally invalid input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Token missing, unparseable, badly signed, or expired
    #[error("invalid or expired token")]
    Unauthorized,

    /// Token valid but bound to a different resource
    #[error("token does not match resource")]
    Forbidden,

    /// Resource absent or inactive
    #[error("resource not found")]
    NotFound,

    /// A stored resource holds data that should never have been persisted
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The external resource lookup failed
    #[error("Resource lookup failed: {0}")]
    Lookup(#[source] anyhow::Error),
}

impl StreamError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StreamError::InvalidArgument(_) => 400,
            StreamError::Unauthorized => 401,
            StreamError::Forbidden => 403,
            StreamError::NotFound => 404,
            StreamError::InternalInconsistency(_) | StreamError::Lookup(_) => 500,
        }
    }

    /// Whether the failure is the caller's fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
