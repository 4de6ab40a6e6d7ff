//! Storage backend trait definition.

use crate::error::StorageResult;

/// How a backend should treat the file(s) behind it when opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open existing storage for reading only.
    ReadOnly,
    /// Open existing storage for reading and writing.
    ReadWrite,
    /// Create storage, discarding anything already there.
    Truncate,
    /// Create storage, failing if it already exists.
    CreateNew,
}

impl Access {
    /// Returns true if the access permits writes.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    /// Returns true if the access creates fresh storage.
    #[must_use]
    pub const fn is_create(self) -> bool {
        matches!(self, Self::Truncate | Self::CreateNew)
    }
}

/// A low-level storage backend for a container.
///
/// Storage backends are **opaque byte stores**. They provide simple operations
/// for reading, appending, and flushing data. The container engine owns all
/// format interpretation.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` pushes buffered data to the driver's persistence target
/// - Backends opened with [`Access::ReadOnly`] reject `append` and `truncate`
///
/// # Implementors
///
/// - [`super::FileBackend`] - `sec2` and `stdio`
/// - [`super::CoreBackend`] - `core`
/// - [`super::FamilyBackend`] - `family`
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read would extend beyond the current size or
    /// an I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is read-only or an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes to the driver's persistence target.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is read-only, `new_size` is greater
    /// than the current size, or the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Releases the backend, persisting whatever the driver persists on close.
    ///
    /// The default implementation flushes writable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&mut self) -> StorageResult<()> {
        if self.is_writable() {
            self.flush()?;
        }
        Ok(())
    }

    /// Returns true if the backend accepts writes.
    fn is_writable(&self) -> bool;

    /// Returns the driver name this backend implements.
    fn driver_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_writability() {
        assert!(!Access::ReadOnly.is_writable());
        assert!(Access::ReadWrite.is_writable());
        assert!(Access::Truncate.is_writable());
        assert!(Access::CreateNew.is_writable());
    }

    #[test]
    fn access_creation() {
        assert!(!Access::ReadOnly.is_create());
        assert!(!Access::ReadWrite.is_create());
        assert!(Access::Truncate.is_create());
        assert!(Access::CreateNew.is_create());
    }
}
