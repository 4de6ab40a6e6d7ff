//! Mode tokens and the open/create flags they resolve to.

use crate::error::{CoreError, CoreResult};
use h5file_storage::Access;
use std::fmt;
use std::str::FromStr;

/// How a container is opened or created.
///
/// Resolved from the POSIX-like tokens `r`, `r+`, `w`, `w-`/`x` and `a`.
/// Resolution is pure: a rejected token never reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// `r`: open an existing container read-only.
    ReadOnly,
    /// `r+`: open an existing container read-write.
    ReadWrite,
    /// `w`: create a container, discarding existing content.
    CreateTruncate,
    /// `w-` or `x`: create a container, failing if one exists.
    CreateExclusive,
    /// `a`: open read-write if present, otherwise create.
    #[default]
    Append,
}

/// Engine-level disposition for an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlags {
    /// Open existing storage only.
    Open(Access),
    /// Create storage.
    Create(Access),
    /// Open existing storage, or create it when absent.
    OpenOrCreate {
        /// Access used when the container exists.
        open: Access,
        /// Access used when it does not.
        create: Access,
    },
}

/// The access a container has once open.
///
/// Creation is a property of the open call, not of the handle, so every
/// writable handle reports [`AccessMode::ReadWrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Reported as `r`.
    ReadOnly,
    /// Reported as `r+`.
    ReadWrite,
}

impl Mode {
    /// Every mode, in token order.
    pub const ALL: [Mode; 5] = [
        Mode::ReadOnly,
        Mode::ReadWrite,
        Mode::CreateTruncate,
        Mode::CreateExclusive,
        Mode::Append,
    ];

    /// Resolves a user-facing mode token.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMode`] for anything outside
    /// `{r, r+, w, w-, x, a}`.
    pub fn resolve(token: &str) -> CoreResult<Self> {
        let mode = match token {
            "r" => Self::ReadOnly,
            "r+" => Self::ReadWrite,
            "w" => Self::CreateTruncate,
            "w-" | "x" => Self::CreateExclusive,
            "a" => Self::Append,
            _ => return Err(CoreError::invalid_mode(token)),
        };
        tracing::debug!(token, ?mode, "resolved mode");
        Ok(mode)
    }

    /// Returns the canonical token for this mode.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::ReadOnly => "r",
            Self::ReadWrite => "r+",
            Self::CreateTruncate => "w",
            Self::CreateExclusive => "w-",
            Self::Append => "a",
        }
    }

    /// Returns the engine-level flags for this mode.
    #[must_use]
    pub const fn flags(self) -> OpenFlags {
        match self {
            Self::ReadOnly => OpenFlags::Open(Access::ReadOnly),
            Self::ReadWrite => OpenFlags::Open(Access::ReadWrite),
            Self::CreateTruncate => OpenFlags::Create(Access::Truncate),
            Self::CreateExclusive => OpenFlags::Create(Access::CreateNew),
            Self::Append => OpenFlags::OpenOrCreate {
                open: Access::ReadWrite,
                create: Access::CreateNew,
            },
        }
    }

    /// Returns the access an open handle will have.
    #[must_use]
    pub const fn access_mode(self) -> AccessMode {
        match self {
            Self::ReadOnly => AccessMode::ReadOnly,
            _ => AccessMode::ReadWrite,
        }
    }

    /// Returns true if this mode may create a container.
    #[must_use]
    pub const fn may_create(self) -> bool {
        !matches!(self.flags(), OpenFlags::Open(_))
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl AccessMode {
    /// Returns the reported token, `r` or `r+`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "r",
            Self::ReadWrite => "r+",
        }
    }

    /// Returns true for read-only access.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
