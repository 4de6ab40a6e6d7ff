//! Shared container handles.
//!
//! Every open container has exactly one [`Shared`] state behind an `Arc`.
//! [`Container`] values are counted handles to it: cloning one, or asking a
//! sub-object for its owner, yields another alias of the same state, and
//! dropping the last counted alias closes the container. [`HandleRef`] is the
//! uncounted back-reference held by sub-objects; it can always reach the
//! state but never keeps the container open.

use crate::config::Config;
use crate::driver::{DriverOptions, DriverSpec};
use crate::engine::{ContainerId, Engine};
use crate::error::{CoreError, CoreResult};
use crate::group::Group;
use crate::libver::{Libver, VersionBounds};
use crate::mode::{AccessMode, Mode, OpenFlags};
use h5file_storage::Access;
use parking_lot::Mutex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// State shared by every alias of one open container.
pub(crate) struct Shared {
    id: ContainerId,
    filename: PathBuf,
    mode: Mode,
    driver: DriverSpec,
    libver: VersionBounds,
    /// `None` once closed.
    engine: Mutex<Option<Engine>>,
    /// Live [`Container`] values; [`HandleRef`]s are not counted.
    handles: AtomicUsize,
}

impl Shared {
    fn is_open(&self) -> bool {
        self.engine.lock().is_some()
    }

    fn close(&self) -> CoreResult<()> {
        // Taken before closing so every alias reads Closed even if the
        // final commit fails.
        let Some(engine) = self.engine.lock().take() else {
            return Ok(());
        };
        tracing::info!(path = %self.filename.display(), id = %self.id, "closing container");
        engine
            .close()
            .map_err(|e| CoreError::storage(&self.filename, e))
    }

    fn check_writable(&self, engine: &Option<Engine>) -> CoreResult<()> {
        if engine.is_none() {
            return Err(CoreError::Closed);
        }
        if self.mode.access_mode().is_read_only() {
            return Err(CoreError::ReadOnly {
                path: self.filename.clone(),
            });
        }
        Ok(())
    }

    /// Runs a read-only query against the open engine.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Engine) -> R) -> CoreResult<R> {
        let guard = self.engine.lock();
        let engine = guard.as_ref().ok_or(CoreError::Closed)?;
        Ok(f(engine))
    }

    /// Runs a mutation against the open engine after the writability check.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Engine) -> CoreResult<R>) -> CoreResult<R> {
        let mut guard = self.engine.lock();
        self.check_writable(&guard)?;
        match guard.as_mut() {
            Some(engine) => f(engine),
            None => Err(CoreError::Closed),
        }
    }
}

/// A handle to an open (or since closed) container.
///
/// Cloning a `Container` produces another alias of the same container, not a
/// second open. All aliases, including those reached through
/// [`Group::file`], compare equal, report the same mode, and observe a close
/// made through any one of them.
///
/// # Example
///
/// ```rust,no_run
/// use h5file_core::Container;
///
/// let file = Container::open("data.h5", "w")?;
/// let group = file.create_group("foo")?;
/// assert_eq!(group.file(), file);
/// assert_eq!(file.mode().as_str(), "r+");
///
/// group.file().close()?;
/// assert!(!file.is_open());
/// # Ok::<(), h5file_core::CoreError>(())
/// ```
pub struct Container {
    shared: Arc<Shared>,
}

/// Uncounted back-reference from a sub-object to its container.
#[derive(Clone)]
pub struct HandleRef {
    shared: Arc<Shared>,
}

/// Opens a container from loosely typed arguments.
///
/// This is [`Config::from_tokens`] followed by [`Container::open_with_config`];
/// configuration errors are raised before the path is looked at.
///
/// # Errors
///
/// Any configuration error, or `NotFound`, `AlreadyExists`, `Io` from the
/// open itself.
pub fn open(
    path: impl AsRef<Path>,
    mode: &str,
    driver: Option<&str>,
    driver_options: &DriverOptions,
    libver: Option<Libver<'_>>,
) -> CoreResult<Container> {
    let config = Config::from_tokens(mode, driver, driver_options, libver)?;
    Container::open_with_config(path, config)
}

impl Container {
    /// Opens a container with a mode token and default driver and bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMode`] for an unknown token, and the open
    /// errors of [`Container::open_with_config`].
    pub fn open(path: impl AsRef<Path>, mode: &str) -> CoreResult<Self> {
        let mode = Mode::resolve(mode)?;
        Self::open_with_config(path, Config::new().mode(mode))
    }

    /// Opens a container with a full configuration.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `r`/`r+` find no container
    /// - [`CoreError::AlreadyExists`] if `w-` finds one
    /// - [`CoreError::Io`] for any other engine failure, including a corrupt
    ///   container
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let driver = config.driver.resolved();
        let libver = config.bounds();

        let engine = match config.mode.flags() {
            OpenFlags::Open(access) => Self::load_engine(path, &driver, access)?,
            OpenFlags::Create(access) => Self::create_engine(path, &driver, access, libver)?,
            OpenFlags::OpenOrCreate { open, create } => {
                if driver.exists(path) {
                    Self::load_engine(path, &driver, open)?
                } else {
                    Self::create_engine(path, &driver, create, libver)?
                }
            }
        };

        let shared = Shared {
            id: engine.id(),
            filename: path.to_path_buf(),
            mode: config.mode,
            driver,
            libver,
            engine: Mutex::new(Some(engine)),
            handles: AtomicUsize::new(0),
        };
        Ok(Self::from_shared(Arc::new(shared)))
    }

    fn load_engine(path: &Path, driver: &DriverSpec, access: Access) -> CoreResult<Engine> {
        let backend = driver
            .open_backend(path, access)
            .map_err(|e| CoreError::storage(path, e))?;
        let engine = Engine::load(backend).map_err(|e| CoreError::storage(path, e))?;
        tracing::info!(path = %path.display(), driver = driver.name(), ?access, id = %engine.id(), "opened container");
        Ok(engine)
    }

    fn create_engine(
        path: &Path,
        driver: &DriverSpec,
        access: Access,
        libver: VersionBounds,
    ) -> CoreResult<Engine> {
        let backend = driver
            .open_backend(path, access)
            .map_err(|e| CoreError::storage(path, e))?;
        let engine = Engine::create(backend, libver).map_err(|e| CoreError::storage(path, e))?;
        tracing::info!(path = %path.display(), driver = driver.name(), %libver, id = %engine.id(), "created container");
        Ok(engine)
    }

    fn from_shared(shared: Arc<Shared>) -> Self {
        shared.handles.fetch_add(1, Ordering::AcqRel);
        Self { shared }
    }

    /// Closes the container for every alias.
    ///
    /// Closing an already closed container does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the final commit fails. The container is
    /// closed either way.
    pub fn close(&self) -> CoreResult<()> {
        self.shared.close()
    }

    /// Persists buffered changes without closing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] on a closed container and
    /// [`CoreError::Io`] if the engine fails.
    pub fn flush(&self) -> CoreResult<()> {
        let mut guard = self.shared.engine.lock();
        let engine = guard.as_mut().ok_or(CoreError::Closed)?;
        engine
            .commit()
            .map_err(|e| CoreError::storage(&self.shared.filename, e))
    }

    /// Fails unless the container is open read-write.
    ///
    /// # Errors
    ///
    /// [`CoreError::Closed`] or [`CoreError::ReadOnly`].
    pub fn assert_writable(&self) -> CoreResult<()> {
        let guard = self.shared.engine.lock();
        self.shared.check_writable(&guard)
    }

    /// Returns true between a successful open and the first close of any alias.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Returns the access mode, `r` or `r+`.
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.shared.mode.access_mode()
    }

    /// Returns the mode the container was opened with.
    #[must_use]
    pub fn open_mode(&self) -> Mode {
        self.shared.mode
    }

    /// Returns the driver name.
    #[must_use]
    pub fn driver(&self) -> &'static str {
        self.shared.driver.name()
    }

    /// Returns the resolved driver configuration.
    #[must_use]
    pub fn driver_spec(&self) -> DriverSpec {
        self.shared.driver
    }

    /// Returns the compatibility bounds this handle was opened with.
    #[must_use]
    pub fn libver(&self) -> VersionBounds {
        self.shared.libver
    }

    /// Returns the bounds recorded in the container itself.
    ///
    /// For an existing container these may differ from [`Container::libver`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] on a closed container.
    pub fn stored_libver(&self) -> CoreResult<VersionBounds> {
        self.shared.read(Engine::stored_bounds)
    }

    /// Returns the path exactly as given to open.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.shared.filename
    }

    /// Returns the engine identifier.
    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.shared.id
    }

    /// Returns the engine identifier.
    #[deprecated(note = "use `Container::id`")]
    #[must_use]
    pub fn fid(&self) -> ContainerId {
        self.id()
    }

    /// Returns the number of bytes the container occupies in its driver.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] or [`CoreError::Io`].
    pub fn size(&self) -> CoreResult<u64> {
        self.shared
            .read(Engine::size)?
            .map_err(|e| CoreError::storage(&self.shared.filename, e))
    }

    /// Returns a back-reference for a sub-object.
    #[must_use]
    pub fn handle_ref(&self) -> HandleRef {
        HandleRef {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns the root group.
    #[must_use]
    pub fn root(&self) -> Group {
        Group::root(self.handle_ref())
    }

    /// Creates a group below the root.
    ///
    /// # Errors
    ///
    /// See [`Group::create_group`].
    pub fn create_group(&self, name: &str) -> CoreResult<Group> {
        self.root().create_group(name)
    }

    /// Returns a group, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`Group::require_group`].
    pub fn require_group(&self, name: &str) -> CoreResult<Group> {
        self.root().require_group(name)
    }

    /// Opens an existing group.
    ///
    /// # Errors
    ///
    /// See [`Group::group`].
    pub fn group(&self, name: &str) -> CoreResult<Group> {
        self.root().group(name)
    }

    /// Returns true if a group exists at `name`. Always false once closed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.root().contains(name)
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self::from_shared(Arc::clone(&self.shared))
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.shared.handles.fetch_sub(1, Ordering::AcqRel) == 1 {
            if let Err(e) = self.shared.close() {
                tracing::warn!(path = %self.shared.filename.display(), error = %e, "failed to close container on drop");
            }
        }
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Container {}

impl Hash for Container {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shared.id.hash(state);
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_open() {
            return f.write_str("<closed h5file container>");
        }
        let name = self
            .shared
            .filename
            .file_name()
            .map_or_else(|| self.shared.filename.to_string_lossy(), |n| n.to_string_lossy());
        write!(f, "<h5file container {name:?} (mode {})>", self.mode())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.shared.id)
            .field("filename", &self.shared.filename)
            .field("mode", &self.shared.mode)
            .field("driver", &self.shared.driver)
            .field("libver", &self.shared.libver)
            .field("is_open", &self.is_open())
            .finish()
    }
}

impl HandleRef {
    /// Returns a counted handle to the owning container.
    ///
    /// Every back-reference of one container yields the same container.
    #[must_use]
    pub fn owner(&self) -> Container {
        Container::from_shared(Arc::clone(&self.shared))
    }

    /// Returns true if the owning container is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }
}

impl PartialEq for HandleRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for HandleRef {}

impl fmt::Debug for HandleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandleRef").field(&self.shared.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn clone_is_an_alias() {
        let dir = tempdir().unwrap();
        let file = Container::open(dir.path().join("a.h5"), "w").unwrap();
        let alias = file.clone();

        assert_eq!(file, alias);
        assert_eq!(file.id(), alias.id());
        alias.close().unwrap();
        assert!(!file.is_open());
    }

    #[test]
    fn dropping_last_handle_closes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.h5");
        let file = Container::open(&path, "w").unwrap();
        let back = file.handle_ref();
        let alias = file.clone();

        drop(file);
        assert!(back.is_open());
        drop(alias);
        assert!(!back.is_open());
        assert!(!back.owner().is_open());
    }

    #[test]
    fn handle_ref_does_not_keep_open() {
        let dir = tempdir().unwrap();
        let back = Container::open(dir.path().join("a.h5"), "w")
            .unwrap()
            .handle_ref();
        assert!(!back.is_open());
    }

    #[test]
    fn flush_requires_open() {
        let dir = tempdir().unwrap();
        let file = Container::open(dir.path().join("a.h5"), "w").unwrap();
        file.flush().unwrap();
        file.close().unwrap();
        assert!(matches!(file.flush(), Err(CoreError::Closed)));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let file = Container::open(dir.path().join("a.h5"), "w").unwrap();
        file.close().unwrap();
        file.close().unwrap();
        assert!(!file.is_open());
    }

    #[test]
    fn assert_writable_states() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.h5");

        let file = Container::open(&path, "w").unwrap();
        file.assert_writable().unwrap();
        file.close().unwrap();
        assert!(matches!(file.assert_writable(), Err(CoreError::Closed)));

        let file = Container::open(&path, "r").unwrap();
        assert!(matches!(
            file.assert_writable(),
            Err(CoreError::ReadOnly { .. })
        ));
    }

    #[test]
    fn display_open_and_closed() {
        let dir = tempdir().unwrap();
        let file = Container::open(dir.path().join("shown.h5"), "w").unwrap();
        assert_eq!(
            file.to_string(),
            "<h5file container \"shown.h5\" (mode r+)>"
        );
        file.close().unwrap();
        assert_eq!(file.to_string(), "<closed h5file container>");
        assert!(format!("{file:?}").contains("is_open: false"));
    }

    #[test]
    fn metadata_survives_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.h5");
        let file = Container::open(&path, "w").unwrap();
        file.close().unwrap();

        assert_eq!(file.filename(), path);
        assert_eq!(file.driver(), "sec2");
        assert_eq!(file.mode().as_str(), "r+");
        assert_eq!(file.libver(), VersionBounds::WIDEST);
        assert!(matches!(file.stored_libver(), Err(CoreError::Closed)));
    }
}
