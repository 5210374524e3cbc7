//! Namespace error types.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Error taxonomy for namespace and backend operations.
///
/// Only [`VfsError::NotFound`] is ever absorbed by the resolution
/// algorithm; every other kind propagates to the caller unchanged.
#[derive(Debug, Error)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied by the operating system.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed or traversal-attempting path, rejected before any
    /// binding is consulted.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Any other underlying OS failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Classify an OS error against the taxonomy, keeping the virtual
    /// path that failed rather than the real one.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::Io(err),
        }
    }

    /// True if this error means "the path does not exist here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convert VfsError to std::io::Error for io-based callers.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::Io(e) => e,
        }
    }
}

/// Namespace result type.
pub type VfsResult<T> = Result<T, VfsError>;
