//! Mapping engine error types.

use std::io;
use thiserror::Error;

/// Error returned by the path classifier, backends and the operation adapter.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path is malformed, too deep, or contains a forbidden character.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Location does not exist in the database.
    #[error("not found: {0}")]
    NotFound(String),

    /// Location already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Expected a container kind.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a leaf kind.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Nodes of this kind cannot be created as files.
    #[error("read-only location: {0}")]
    ReadOnly(String),

    /// Operation is legal in general but not for this kind or backend.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Rename between two different location kinds.
    #[error("cannot rename {from} to {to}: different location kinds")]
    CrossKind { from: String, to: String },

    /// The database library reported an error.
    #[error("backend failure: {0}")]
    Backend(String),

    /// Start-up configuration error (registry, backend selection).
    #[error("configuration error: {0}")]
    Config(String),
}

impl FsError {
    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a ReadOnly error.
    pub fn read_only(path: impl Into<String>) -> Self {
        Self::ReadOnly(path.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a Backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// POSIX error number for the host runtime.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::InvalidPath(_) => libc::EINVAL,
            FsError::NotFound(_) => libc::ENOENT,
            FsError::AlreadyExists(_) => libc::EEXIST,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::ReadOnly(_) => libc::EROFS,
            FsError::Unsupported(_) => libc::EOPNOTSUPP,
            FsError::CrossKind { .. } => libc::EXDEV,
            FsError::Backend(_) => libc::EIO,
            FsError::Config(_) => libc::EINVAL,
        }
    }

    /// Negated error number, the host runtime's failure convention.
    pub fn to_host(&self) -> i32 {
        -self.errno()
    }
}

impl From<rusqlite::Error> for FsError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Convert FsError to std::io::Error for driver use.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            FsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            FsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            FsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            FsError::ReadOnly(msg) => io::Error::new(io::ErrorKind::ReadOnlyFilesystem, msg),
            FsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            FsError::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            FsError::CrossKind { from, to } => io::Error::new(
                io::ErrorKind::CrossesDevices,
                format!("cannot rename {from} to {to}"),
            ),
            FsError::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            FsError::Backend(msg) => io::Error::other(msg),
        }
    }
}

/// Mapping engine result type.
pub type FsResult<T> = Result<T, FsError>;
