//! Format-compatibility bounds.
//!
//! Bounds restrict which structural variants the engine may write into a
//! container. They only take effect when creating; an existing container
//! keeps the bounds it was created with.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A format-version tag, ordered from oldest to newest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VersionTag {
    /// The oldest format every reader understands.
    Earliest,
    /// The 1.8 format family.
    V18,
    /// The 1.10 format family.
    V110,
    /// The newest format this engine writes.
    Latest,
}

impl VersionTag {
    /// Every tag, in ascending order.
    pub const ALL: [VersionTag; 4] = [Self::Earliest, Self::V18, Self::V110, Self::Latest];

    /// Parses a tag name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBounds`] for unknown names.
    pub fn parse(name: &str) -> CoreResult<Self> {
        match name {
            "earliest" => Ok(Self::Earliest),
            "v18" => Ok(Self::V18),
            "v110" => Ok(Self::V110),
            "latest" => Ok(Self::Latest),
            _ => Err(CoreError::invalid_bounds(format!(
                "unknown version tag {name:?}"
            ))),
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::V18 => "v18",
            Self::V110 => "v110",
            Self::Latest => "latest",
        }
    }

    /// Returns the on-disk code of the tag.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes an on-disk tag code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Earliest),
            1 => Some(Self::V18),
            2 => Some(Self::V110),
            3 => Some(Self::Latest),
            _ => None,
        }
    }

    /// Returns the superblock revision written for a container whose lower
    /// bound is this tag.
    #[must_use]
    pub const fn superblock_revision(self) -> u16 {
        match self {
            Self::Earliest => 0,
            Self::V18 => 2,
            Self::V110 | Self::Latest => 3,
        }
    }
}

impl FromStr for VersionTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered `(low, high)` pair of version tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionBounds {
    low: VersionTag,
    high: VersionTag,
}

impl VersionBounds {
    /// The widest range, `(earliest, latest)`.
    pub const WIDEST: Self = Self {
        low: VersionTag::Earliest,
        high: VersionTag::Latest,
    };

    /// Creates bounds, checking `low <= high`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBounds`] if `low` is newer than `high`.
    pub fn new(low: VersionTag, high: VersionTag) -> CoreResult<Self> {
        if low > high {
            return Err(CoreError::invalid_bounds(format!(
                "low bound {low} is newer than high bound {high}"
            )));
        }
        Ok(Self { low, high })
    }

    /// Creates bounds pinned to a single tag.
    #[must_use]
    pub const fn single(tag: VersionTag) -> Self {
        Self {
            low: tag,
            high: tag,
        }
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn low(&self) -> VersionTag {
        self.low
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn high(&self) -> VersionTag {
        self.high
    }

    /// Returns the bounds as a pair of tag names.
    #[must_use]
    pub const fn as_strs(&self) -> (&'static str, &'static str) {
        (self.low.as_str(), self.high.as_str())
    }
}

impl Default for VersionBounds {
    fn default() -> Self {
        Self::WIDEST
    }
}

impl fmt::Display for VersionBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

/// A user-supplied compatibility argument: one tag or a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Libver<'a> {
    /// Sets both ends to the same tag.
    Single(&'a str),
    /// Sets `(low, high)` directly.
    Pair(&'a str, &'a str),
}

impl<'a> Libver<'a> {
    /// Validates the argument into bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBounds`] for unknown tags or a pair whose
    /// low end is newer than its high end.
    pub fn resolve(self) -> CoreResult<VersionBounds> {
        match self {
            Self::Single(tag) => Ok(VersionBounds::single(VersionTag::parse(tag)?)),
            Self::Pair(low, high) => {
                VersionBounds::new(VersionTag::parse(low)?, VersionTag::parse(high)?)
            }
        }
    }
}

impl<'a> From<&'a str> for Libver<'a> {
    fn from(tag: &'a str) -> Self {
        Self::Single(tag)
    }
}

impl<'a> From<(&'a str, &'a str)> for Libver<'a> {
    fn from((low, high): (&'a str, &'a str)) -> Self {
        Self::Pair(low, high)
    }
}

/// Normalizes an optional compatibility argument.
///
/// Omission yields `default`, which callers normally set to
/// [`VersionBounds::WIDEST`].
///
/// # Errors
///
/// Propagates [`Libver::resolve`] errors.
pub fn normalize(value: Option<Libver<'_>>, default: VersionBounds) -> CoreResult<VersionBounds> {
    let bounds = match value {
        Some(libver) => libver.resolve()?,
        None => default,
    };
    tracing::debug!(%bounds, "normalized compatibility bounds");
    Ok(bounds)
}
