//! Error types for storage operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file a non-creating open expected is missing.
    #[error("no such file: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An exclusive create found a file already in place.
    #[error("file already exists: {}", path.display())]
    AlreadyExists {
        /// The existing path.
        path: PathBuf,
    },

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// The storage is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// A write was attempted on storage opened read-only.
    #[error("storage is read-only")]
    ReadOnly,

    /// The path is unusable for the selected driver.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    /// Maps an error from opening `path` onto the distinguished variants.
    ///
    /// `NotFound` and `AlreadyExists` are lifted out of the generic I/O error
    /// so callers can tell a missing file from a permission problem.
    pub fn from_open(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Self::Io(err),
        }
    }
}
