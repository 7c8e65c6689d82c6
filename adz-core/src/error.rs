use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdzError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not an ADZ container (signature mismatch or truncated header).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Header and records disagree about sizes, offsets or counts.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("format limit exceeded for {}: {reason}", .path.display())]
    FormatLimit { path: PathBuf, reason: String },

    #[error("source changed while archiving {}: planned {expected} bytes, found {actual}", .path.display())]
    SourceChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl AdzError {
    /// Classify an error raised while reading the source tree.
    pub(crate) fn from_source(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AdzError::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => AdzError::PermissionDenied(path.to_path_buf()),
            _ => AdzError::Io(err),
        }
    }

    pub(crate) fn limit(path: &Path, reason: impl Into<String>) -> Self {
        AdzError::FormatLimit {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        AdzError::CorruptArchive(msg.into())
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, AdzError>;
