//! In-memory storage backend for the `core` driver.

use crate::backend::{Access, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::file::open_file;
use parking_lot::RwLock;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default growth increment for the in-memory image.
pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024;

/// An in-memory storage backend.
///
/// The whole container image lives in memory. Storage grows in whole
/// `block_size` increments. When a backing file is attached, the image is
/// written to it on `flush` and on `close`; without one, the content exists
/// only in memory and vanishes when the backend is dropped.
///
/// # Example
///
/// ```rust
/// use h5file_storage::{CoreBackend, StorageBackend};
///
/// let mut backend = CoreBackend::anonymous(1024);
/// let offset = backend.append(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug)]
pub struct CoreBackend {
    data: RwLock<Vec<u8>>,
    block_size: u64,
    backing: Option<PathBuf>,
    writable: bool,
    dirty: bool,
}

impl CoreBackend {
    /// Creates an empty, writable backend with no backing file.
    #[must_use]
    pub fn anonymous(block_size: u64) -> Self {
        Self {
            data: RwLock::new(Vec::new()),
            block_size: block_size.max(1),
            backing: None,
            writable: true,
            dirty: false,
        }
    }

    /// Opens a `core` backend for `path`.
    ///
    /// Existing files are read fully into memory. Creating accesses start with
    /// an empty image; when `backing_store` is set the file is created (or
    /// truncated) right away so that exclusive creation is decided up front.
    /// Without a backing store nothing is ever written to `path`, and
    /// read-only opens never write back either.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] or [`StorageError::AlreadyExists`]
    /// as [`super::FileBackend::open`] does, and [`StorageError::Io`] for
    /// other failures.
    pub fn open(
        path: &Path,
        access: Access,
        block_size: u64,
        backing_store: bool,
    ) -> StorageResult<Self> {
        let data = match access {
            Access::ReadOnly | Access::ReadWrite => {
                let mut file = open_file(path, Access::ReadOnly)?;
                let mut data = Vec::new();
                file.read_to_end(&mut data)?;
                data
            }
            Access::Truncate | Access::CreateNew if backing_store => {
                open_file(path, access)?;
                Vec::new()
            }
            Access::CreateNew => {
                if path.exists() {
                    return Err(StorageError::AlreadyExists {
                        path: path.to_path_buf(),
                    });
                }
                Vec::new()
            }
            Access::Truncate => Vec::new(),
        };

        let writable = access.is_writable();
        let backing = (backing_store && writable).then(|| path.to_path_buf());

        tracing::debug!(
            path = %path.display(),
            ?access,
            block_size,
            backing_store,
            size = data.len(),
            "opened core backend"
        );

        Ok(Self {
            data: RwLock::new(data),
            block_size: block_size.max(1),
            backing,
            writable,
            dirty: false,
        })
    }

    /// Rounds `len` up to a whole number of blocks.
    fn round_to_block(&self, len: u64) -> u64 {
        len.div_ceil(self.block_size) * self.block_size
    }
}

impl StorageBackend for CoreBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let offset_usize = offset as usize;
        let end = offset_usize.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset_usize..end].to_vec())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }

        let block_target = self.round_to_block(self.data.read().len() as u64 + new_data.len() as u64);
        let mut data = self.data.write();
        let offset = data.len() as u64;
        if block_target as usize > data.capacity() {
            let additional = block_target as usize - data.len();
            data.reserve_exact(additional);
        }
        data.extend_from_slice(new_data);
        self.dirty |= !new_data.is_empty();
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        let Some(path) = self.backing.as_ref() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        std::fs::write(path, self.data.read().as_slice())?;
        self.dirty = false;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.flush()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }

        let mut data = self.data.write();
        let current_size = data.len() as u64;

        if new_size > current_size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, current_size
                ),
            )));
        }

        data.truncate(new_size as usize);
        self.dirty = true;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn driver_name(&self) -> &'static str {
        "core"
    }
}
