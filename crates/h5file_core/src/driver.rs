//! Low-level driver selection and configuration.
//!
//! A driver name plus a loosely typed option map is validated into a
//! [`DriverSpec`] up front. The spec is an immutable description; it only
//! turns into a live backend when a container is opened.

use crate::error::{CoreError, CoreResult};
use h5file_storage::{
    Access, Buffering, CoreBackend, FamilyBackend, FileBackend, StorageBackend, StorageResult,
    DEFAULT_BLOCK_SIZE, DEFAULT_MEMBER_SIZE, MEMBER_PLACEHOLDER,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the driver selected when none is given.
pub const PLATFORM_DEFAULT_DRIVER: &str = "sec2";

/// A validated driver choice with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverSpec {
    /// The platform default (`sec2`).
    #[default]
    Default,
    /// Buffered C-stdio style I/O.
    Stdio,
    /// Unbuffered POSIX section-2 I/O.
    Sec2,
    /// Whole container held in memory.
    Core {
        /// Persist the image to the path on flush and close.
        backing_store: bool,
        /// Growth increment for the image; `None` uses the engine default.
        block_size: Option<u64>,
    },
    /// Container split across `%d`-numbered member files.
    Family {
        /// Size of each member; `None` uses the engine default.
        member_size: Option<u64>,
    },
}

/// A single driver option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOption {
    /// A boolean flag.
    Bool(bool),
    /// An integer quantity.
    Int(i64),
    /// Free text.
    Str(String),
}

/// Driver options keyed by name.
///
/// # Example
///
/// ```rust
/// use h5file_core::{DriverOptions, DriverSpec};
///
/// let options = DriverOptions::new()
///     .with("backing_store", false)
///     .with("block_size", 1024);
/// let spec = DriverSpec::build(Some("core"), &options).unwrap();
/// assert_eq!(
///     spec,
///     DriverSpec::Core { backing_store: false, block_size: Some(1024) }
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    entries: BTreeMap<String, DriverOption>,
}

impl DriverOption {
    /// Parses a command-line style value: `true`/`false`, an integer, or text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map_or_else(|_| Self::Str(raw.to_string()), Self::Int),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
        }
    }
}

impl From<bool> for DriverOption {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DriverOption {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DriverOption {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for DriverOption {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl fmt::Display for DriverOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl DriverOptions {
    /// Creates an empty option map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option, replacing any previous value for the key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DriverOption>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an option, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DriverOption>,
    ) -> Option<DriverOption> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DriverOption> {
        self.entries.get(key)
    }

    /// Returns true if no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DriverOption)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<DriverOption>> FromIterator<(K, V)> for DriverOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

fn expect_bool(driver: &'static str, key: &str, value: &DriverOption) -> CoreResult<bool> {
    match value {
        DriverOption::Bool(v) => Ok(*v),
        other => Err(CoreError::invalid_option(
            driver,
            key,
            format!("expected boolean, got {} {other}", other.kind()),
        )),
    }
}

fn expect_positive(driver: &'static str, key: &str, value: &DriverOption) -> CoreResult<u64> {
    match value {
        DriverOption::Int(v) if *v > 0 => Ok(*v as u64),
        DriverOption::Int(v) => Err(CoreError::invalid_option(
            driver,
            key,
            format!("must be a positive integer, got {v}"),
        )),
        other => Err(CoreError::invalid_option(
            driver,
            key,
            format!("expected integer, got {} {other}", other.kind()),
        )),
    }
}

impl DriverSpec {
    /// Validates a driver name and its options.
    ///
    /// `None` selects the platform default, which accepts no options.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedDriver`] for unknown names and
    /// [`CoreError::InvalidOption`] for options that do not belong to the
    /// driver or carry an unusable value.
    pub fn build(name: Option<&str>, options: &DriverOptions) -> CoreResult<Self> {
        let spec = match name {
            None => {
                Self::reject_all(PLATFORM_DEFAULT_DRIVER, options)?;
                Self::Default
            }
            Some("sec2") => {
                Self::reject_all("sec2", options)?;
                Self::Sec2
            }
            Some("stdio") => {
                Self::reject_all("stdio", options)?;
                Self::Stdio
            }
            Some("core") => {
                let mut backing_store = true;
                let mut block_size = None;
                for (key, value) in options.iter() {
                    match key {
                        "backing_store" => backing_store = expect_bool("core", key, value)?,
                        "block_size" => block_size = Some(expect_positive("core", key, value)?),
                        _ => {
                            return Err(CoreError::invalid_option(
                                "core",
                                key,
                                "not accepted by this driver",
                            ))
                        }
                    }
                }
                Self::Core {
                    backing_store,
                    block_size,
                }
            }
            Some("family") => {
                let mut member_size = None;
                for (key, value) in options.iter() {
                    match key {
                        "member_size" | "memb_size" => {
                            member_size = Some(expect_positive("family", key, value)?);
                        }
                        _ => {
                            return Err(CoreError::invalid_option(
                                "family",
                                key,
                                "not accepted by this driver",
                            ))
                        }
                    }
                }
                Self::Family { member_size }
            }
            Some(other) => return Err(CoreError::unsupported_driver(other)),
        };

        tracing::debug!(?spec, "built driver");
        Ok(spec)
    }

    fn reject_all(driver: &'static str, options: &DriverOptions) -> CoreResult<()> {
        match options.iter().next() {
            Some((key, _)) => Err(CoreError::invalid_option(
                driver,
                key,
                "not accepted by this driver",
            )),
            None => Ok(()),
        }
    }

    /// A `core` driver with the default block size.
    #[must_use]
    pub const fn core(backing_store: bool) -> Self {
        Self::Core {
            backing_store,
            block_size: None,
        }
    }

    /// Replaces [`DriverSpec::Default`] with the concrete platform driver.
    #[must_use]
    pub const fn resolved(self) -> Self {
        match self {
            Self::Default => Self::Sec2,
            other => other,
        }
    }

    /// Returns the name of the driver that will actually be used.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default | Self::Sec2 => "sec2",
            Self::Stdio => "stdio",
            Self::Core { .. } => "core",
            Self::Family { .. } => "family",
        }
    }

    /// Returns the path whose presence decides whether a container exists.
    ///
    /// For `family` this is member 0; for every other driver the path itself.
    #[must_use]
    pub fn probe_path(&self, path: &Path) -> PathBuf {
        match self {
            Self::Family { .. } => match path.to_str() {
                Some(pattern) => PathBuf::from(pattern.replacen(MEMBER_PLACEHOLDER, "0", 1)),
                None => path.to_path_buf(),
            },
            _ => path.to_path_buf(),
        }
    }

    /// Returns true if a container already exists at `path` for this driver.
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.probe_path(path).exists()
    }

    /// Opens the storage backend for this driver.
    ///
    /// # Errors
    ///
    /// Propagates the backend's open error.
    pub fn open_backend(&self, path: &Path, access: Access) -> StorageResult<Box<dyn StorageBackend>> {
        let backend: Box<dyn StorageBackend> = match *self {
            Self::Default | Self::Sec2 => {
                Box::new(FileBackend::open(path, access, Buffering::Direct)?)
            }
            Self::Stdio => Box::new(FileBackend::open(path, access, Buffering::Buffered)?),
            Self::Core {
                backing_store,
                block_size,
            } => Box::new(CoreBackend::open(
                path,
                access,
                block_size.unwrap_or(DEFAULT_BLOCK_SIZE),
                backing_store,
            )?),
            Self::Family { member_size } => Box::new(FamilyBackend::open(
                path,
                access,
                member_size.unwrap_or(DEFAULT_MEMBER_SIZE),
            )?),
        };
        Ok(backend)
    }
}

impl fmt::Display for DriverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core {
                backing_store,
                block_size,
            } => {
                write!(f, "core(backing_store={backing_store}")?;
                if let Some(size) = block_size {
                    write!(f, ", block_size={size}")?;
                }
                f.write_str(")")
            }
            Self::Family {
                member_size: Some(size),
            } => write!(f, "family(member_size={size})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_when_unnamed() {
        let spec = DriverSpec::build(None, &DriverOptions::new()).unwrap();
        assert_eq!(spec, DriverSpec::Default);
        assert_eq!(spec.name(), "sec2");
        assert_eq!(spec.resolved(), DriverSpec::Sec2);
    }

    #[test]
    fn named_drivers() {
        let none = DriverOptions::new();
        assert_eq!(DriverSpec::build(Some("sec2"), &none).unwrap(), DriverSpec::Sec2);
        assert_eq!(DriverSpec::build(Some("stdio"), &none).unwrap(), DriverSpec::Stdio);
        assert_eq!(DriverSpec::build(Some("core"), &none).unwrap(), DriverSpec::core(true));
        assert_eq!(
            DriverSpec::build(Some("family"), &none).unwrap(),
            DriverSpec::Family { member_size: None }
        );
    }

    #[test]
    fn unknown_driver_is_unsupported() {
        let err = DriverSpec::build(Some("mpio"), &DriverOptions::new()).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedDriver { ref name } if name == "mpio"));
    }

    #[test]
    fn core_options() {
        let options = DriverOptions::new()
            .with("backing_store", false)
            .with("block_size", 1024);
        let spec = DriverSpec::build(Some("core"), &options).unwrap();
        assert_eq!(
            spec,
            DriverSpec::Core {
                backing_store: false,
                block_size: Some(1024)
            }
        );
        assert_eq!(spec.to_string(), "core(backing_store=false, block_size=1024)");
    }

    #[test]
    fn block_size_without_core_is_rejected() {
        let options = DriverOptions::new().with("block_size", 1024);
        for name in [None, Some("sec2"), Some("stdio"), Some("family")] {
            let err = DriverSpec::build(name, &options).unwrap_err();
            assert!(matches!(err, CoreError::InvalidOption { .. }), "{name:?}");
        }
    }

    #[test]
    fn wrongly_typed_options_are_rejected() {
        let err = DriverSpec::build(
            Some("core"),
            &DriverOptions::new().with("backing_store", "yes"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { .. }));

        let err = DriverSpec::build(Some("core"), &DriverOptions::new().with("block_size", 0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { .. }));

        let err = DriverSpec::build(Some("core"), &DriverOptions::new().with("block_size", -8))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { .. }));
    }

    #[test]
    fn family_member_size_aliases() {
        for key in ["member_size", "memb_size"] {
            let spec =
                DriverSpec::build(Some("family"), &DriverOptions::new().with(key, 4096)).unwrap();
            assert_eq!(
                spec,
                DriverSpec::Family {
                    member_size: Some(4096)
                }
            );
        }
    }

    #[test]
    fn option_parsing() {
        assert_eq!(DriverOption::parse("true"), DriverOption::Bool(true));
        assert_eq!(DriverOption::parse("false"), DriverOption::Bool(false));
        assert_eq!(DriverOption::parse("512"), DriverOption::Int(512));
        assert_eq!(DriverOption::parse("big"), DriverOption::Str("big".into()));
    }

    #[test]
    fn options_from_pairs() {
        let options: DriverOptions = [("block_size", 64), ("other", 1)].into_iter().collect();
        assert_eq!(options.get("block_size"), Some(&DriverOption::Int(64)));
        assert!(!options.is_empty());
    }

    #[test]
    fn family_probe_uses_first_member() {
        let spec = DriverSpec::Family { member_size: None };
        assert_eq!(
            spec.probe_path(Path::new("/tmp/data-%d.h5")),
            PathBuf::from("/tmp/data-0.h5")
        );
        assert_eq!(
            DriverSpec::Sec2.probe_path(Path::new("/tmp/data.h5")),
            PathBuf::from("/tmp/data.h5")
        );
    }

    #[test]
    fn open_backend_matches_driver() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drv.h5");

        for spec in [DriverSpec::Default, DriverSpec::Sec2, DriverSpec::Stdio, DriverSpec::core(true)] {
            let backend = spec.open_backend(&path, Access::Truncate).unwrap();
            assert_eq!(backend.driver_name(), spec.name());
        }

        let family = DriverSpec::Family {
            member_size: Some(128),
        };
        let backend = family
            .open_backend(&dir.path().join("fam-%d.h5"), Access::Truncate)
            .unwrap();
        assert_eq!(backend.driver_name(), "family");
        assert!(family.exists(&dir.path().join("fam-%d.h5")));
    }
}
