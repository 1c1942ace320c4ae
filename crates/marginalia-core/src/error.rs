//! Error types for marginalia.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using marginalia's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status carried by every authorization failure.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// The caller's effective principals do not permit the requested write.
///
/// Raised when the caller cannot write to a group, or when a non-admin tries
/// to change an annotation's permissions. The reason is user facing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct AuthorizationError {
    reason: String,
}

impl AuthorizationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Rejection for a write into a group the caller is not a member of.
    pub fn group_write() -> Self {
        Self::new("Not authorized to write to group.")
    }

    /// Rejection for a permissions change without admin capability.
    pub fn permissions_change() -> Self {
        Self::new("Not authorized to change annotation permissions.")
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Always 401.
    pub fn status_code(&self) -> u16 {
        UNAUTHORIZED_STATUS
    }
}

/// Core error type for marginalia operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Effective principals cannot perform the write
    #[error("Unauthorized: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Annotation store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Search backend operation failed
    #[error("Search backend error: {0}")]
    Backend(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the authorization failure kind.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Authorization(_))
    }

    /// HTTP status a view layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Authorization(e) => e.status_code(),
            Error::NotFound(_) => 404,
            Error::InvalidInput(_) | Error::Serialization(_) => 400,
            Error::Store(_) | Error::Backend(_) | Error::Internal(_) => 500,
        }
    }

    /// Human-readable reason without the variant prefix.
    pub fn reason(&self) -> String {
        match self {
            Error::Authorization(e) => e.reason().to_string(),
            Error::Store(msg)
            | Error::Backend(msg)
            | Error::NotFound(msg)
            | Error::Serialization(msg)
            | Error::InvalidInput(msg)
            | Error::Internal(msg) => msg.clone(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Failure payload rendered to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub reason: String,
}

impl From<&Error> for ErrorBody {
    fn from(e: &Error) -> Self {
        Self {
            status: "failure",
            reason: e.reason(),
        }
    }
}
