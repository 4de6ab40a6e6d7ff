//! Open configuration.

use crate::driver::{DriverOptions, DriverSpec};
use crate::error::CoreResult;
use crate::libver::{normalize, Libver, VersionBounds};
use crate::mode::Mode;

/// Configuration for opening a container.
///
/// Every field is already validated; string-typed callers go through
/// [`Config::from_tokens`], which rejects bad input before any file is
/// touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How the container is opened or created.
    pub mode: Mode,

    /// Low-level driver.
    pub driver: DriverSpec,

    /// Explicit compatibility bounds, if the caller gave any.
    pub libver: Option<VersionBounds>,

    /// Bounds used when `libver` is unset.
    pub default_libver: VersionBounds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            driver: DriverSpec::default(),
            libver: None,
            default_libver: VersionBounds::WIDEST,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves loosely typed open arguments.
    ///
    /// Mode, driver, and bounds are checked in that order; the first
    /// rejection is returned.
    ///
    /// # Errors
    ///
    /// Returns the configuration error of whichever argument is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use h5file_core::{Config, DriverOptions, DriverSpec, Mode};
    ///
    /// let options = DriverOptions::new().with("backing_store", false);
    /// let config = Config::from_tokens("w", Some("core"), &options, Some("latest".into())).unwrap();
    /// assert_eq!(config.mode, Mode::CreateTruncate);
    /// assert_eq!(config.driver, DriverSpec::core(false));
    /// assert_eq!(config.bounds().as_strs(), ("latest", "latest"));
    /// ```
    pub fn from_tokens(
        mode: &str,
        driver: Option<&str>,
        driver_options: &DriverOptions,
        libver: Option<Libver<'_>>,
    ) -> CoreResult<Self> {
        let mode = Mode::resolve(mode)?;
        let driver = DriverSpec::build(driver, driver_options)?;
        let defaults = Self::default();
        let libver = match libver {
            Some(value) => Some(normalize(Some(value), defaults.default_libver)?),
            None => None,
        };
        Ok(Self {
            mode,
            driver,
            libver,
            ..defaults
        })
    }

    /// Sets the mode.
    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the driver.
    #[must_use]
    pub const fn driver(mut self, driver: DriverSpec) -> Self {
        self.driver = driver;
        self
    }

    /// Sets explicit compatibility bounds.
    #[must_use]
    pub const fn libver(mut self, bounds: VersionBounds) -> Self {
        self.libver = Some(bounds);
        self
    }

    /// Sets the bounds used when none are given explicitly.
    #[must_use]
    pub const fn default_libver(mut self, bounds: VersionBounds) -> Self {
        self.default_libver = bounds;
        self
    }

    /// Returns the bounds an open with this configuration will use.
    #[must_use]
    pub fn bounds(&self) -> VersionBounds {
        self.libver.unwrap_or(self.default_libver)
    }
}
