//! Error types for h5file core.

use h5file_storage::StorageError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while opening and using containers.
///
/// The first four variants are configuration errors raised before any file is
/// touched. `NotFound`, `AlreadyExists` and `Io` come from the storage layer
/// while opening (or flushing). The remaining variants report misuse of an
/// already-open handle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The mode token is not one of `r`, `r+`, `w`, `w-`, `x`, `a`.
    #[error("invalid mode {token:?} (must be one of r, r+, w, w-, x, a)")]
    InvalidMode {
        /// The rejected token.
        token: String,
    },

    /// The driver name is unknown.
    #[error("unsupported driver {name:?}")]
    UnsupportedDriver {
        /// The rejected driver name.
        name: String,
    },

    /// A driver option does not apply or has an unusable value.
    #[error("invalid option {option:?} for driver {driver}: {reason}")]
    InvalidOption {
        /// The driver the option was given for.
        driver: &'static str,
        /// The option name.
        option: String,
        /// Why the option was rejected.
        reason: String,
    },

    /// The compatibility bounds are unknown or out of order.
    #[error("invalid compatibility bounds: {message}")]
    InvalidBounds {
        /// Description of the problem.
        message: String,
    },

    /// A non-creating open found no container.
    #[error("unable to open {}: no such container", path.display())]
    NotFound {
        /// The container path.
        path: PathBuf,
    },

    /// An exclusive create found an existing container.
    #[error("unable to create {}: container already exists", path.display())]
    AlreadyExists {
        /// The container path.
        path: PathBuf,
    },

    /// The storage engine rejected the call.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The container path.
        path: PathBuf,
        /// The engine diagnostic.
        #[source]
        source: StorageError,
    },

    /// A mutating call was made on a read-only container.
    #[error("container {} is opened read-only", path.display())]
    ReadOnly {
        /// The container path.
        path: PathBuf,
    },

    /// The container has been closed.
    #[error("container is closed")]
    Closed,

    /// No group exists at the path.
    #[error("group not found: {path}")]
    GroupNotFound {
        /// The absolute group path.
        path: String,
    },

    /// A group already exists at the path.
    #[error("name already exists: {path}")]
    GroupExists {
        /// The absolute group path.
        path: String,
    },

    /// A group name is empty or uses a reserved component.
    #[error("invalid group name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl CoreError {
    /// Creates an invalid mode error.
    pub fn invalid_mode(token: impl Into<String>) -> Self {
        Self::InvalidMode {
            token: token.into(),
        }
    }

    /// Creates an unsupported driver error.
    pub fn unsupported_driver(name: impl Into<String>) -> Self {
        Self::UnsupportedDriver { name: name.into() }
    }

    /// Creates an invalid option error.
    pub fn invalid_option(
        driver: &'static str,
        option: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            driver,
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid bounds error.
    pub fn invalid_bounds(message: impl Into<String>) -> Self {
        Self::InvalidBounds {
            message: message.into(),
        }
    }

    /// Wraps a storage failure on `path`.
    ///
    /// Missing and pre-existing files keep their own variants; everything
    /// else is reported as [`CoreError::Io`] with the engine diagnostic.
    pub fn storage(path: &Path, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::NotFound {
                path: path.to_path_buf(),
            },
            StorageError::AlreadyExists { .. } => Self::AlreadyExists {
                path: path.to_path_buf(),
            },
            source => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Returns true for configuration errors, which are raised before any
    /// storage is touched.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidMode { .. }
                | Self::UnsupportedDriver { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidBounds { .. }
        )
    }

    /// Returns true for misuse of an open handle: mutating a read-only
    /// container or touching a closed one.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        matches!(self, Self::ReadOnly { .. } | Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn storage_not_found_maps_to_not_found() {
        let err = CoreError::storage(
            Path::new("x.h5"),
            StorageError::NotFound {
                path: PathBuf::from("x.h5"),
            },
        );
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn storage_permission_maps_to_io() {
        let err = CoreError::storage(
            Path::new("x.h5"),
            StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        );
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn classification() {
        assert!(CoreError::invalid_mode("q").is_config());
        assert!(CoreError::unsupported_driver("mpio").is_config());
        assert!(CoreError::invalid_bounds("low > high").is_config());
        assert!(!CoreError::Closed.is_config());

        assert!(CoreError::Closed.is_misuse());
        assert!(CoreError::ReadOnly {
            path: PathBuf::from("x.h5")
        }
        .is_misuse());
        assert!(!CoreError::invalid_mode("q").is_misuse());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = CoreError::invalid_option("sec2", "block_size", "not accepted by this driver");
        assert_eq!(
            err.to_string(),
            "invalid option \"block_size\" for driver sec2: not accepted by this driver"
        );
    }
}
