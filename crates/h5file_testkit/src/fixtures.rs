//! Test fixtures and container helpers.
//!
//! Provides convenience functions for setting up test containers
//! and common test scenarios.

use h5file_core::{open, Container, DriverOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A container path inside a temporary directory that is removed on drop.
pub struct TestContainer {
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestContainer {
    /// Reserves a container path without creating anything.
    pub fn new() -> Self {
        Self::named("test.h5")
    }

    /// Reserves a container path with the given file name.
    pub fn named(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            path: temp_dir.path().join(name),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the container path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the temporary directory.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Returns true if anything exists at the container path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Opens the container with a mode token and the default driver.
    pub fn open(&self, mode: &str) -> Container {
        Container::open(&self.path, mode).expect("Failed to open container")
    }

    /// Opens the container with a named driver.
    pub fn open_with_driver(&self, mode: &str, driver: &str, options: &DriverOptions) -> Container {
        open(&self.path, mode, Some(driver), options, None).expect("Failed to open container")
    }

    /// Creates an empty container and closes it.
    pub fn create(&self) {
        self.open("w").close().expect("Failed to close container");
    }
}

impl Default for TestContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a freshly created, writable container.
///
/// # Example
///
/// ```rust,ignore
/// use h5file_testkit::with_temp_container;
///
/// #[test]
/// fn my_test() {
///     with_temp_container(|file| {
///         file.create_group("test").unwrap();
///     });
/// }
/// ```
pub fn with_temp_container<F, R>(f: F) -> R
where
    F: FnOnce(&Container) -> R,
{
    let fixture = TestContainer::new();
    let file = fixture.open("w");
    f(&file)
}

/// Runs a test with a container populated by `setup` and reopened read-only.
pub fn with_read_only_container<S, F, R>(setup: S, f: F) -> R
where
    S: FnOnce(&Container),
    F: FnOnce(&Container) -> R,
{
    let fixture = TestContainer::new();
    let file = fixture.open("w");
    setup(&file);
    file.close().expect("Failed to close container");
    let file = fixture.open("r");
    f(&file)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a closed container holding `/group_0` .. `/group_{n-1}`.
    pub fn populated_container(group_count: usize) -> TestContainer {
        let fixture = TestContainer::new();
        let file = fixture.open("w");
        for i in 0..group_count {
            file.create_group(&format!("group_{i}"))
                .expect("Failed to create group");
        }
        file.close().expect("Failed to close container");
        fixture
    }
}
