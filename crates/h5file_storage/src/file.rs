//! Single-file storage backend for the `sec2` and `stdio` drivers.

use crate::backend::{Access, StorageBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Write buffer size used by the `stdio` driver.
const STDIO_BUFFER_SIZE: usize = 8 * 1024;

/// Opens `path` with the OS flags matching `access`.
pub(crate) fn open_file(path: &Path, access: Access) -> StorageResult<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    match access {
        Access::ReadOnly => {}
        Access::ReadWrite => {
            options.write(true);
        }
        Access::Truncate => {
            options.write(true).create(true).truncate(true);
        }
        Access::CreateNew => {
            options.write(true).create_new(true);
        }
    }
    options
        .open(path)
        .map_err(|e| StorageError::from_open(e, path))
}

/// How writes reach the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffering {
    /// Every append is written straight to the file (`sec2`).
    Direct,
    /// Appends are staged in a user-space buffer and written in batches (`stdio`).
    Buffered,
}

/// A file-based storage backend.
///
/// This backend provides persistent storage using OS file APIs. The
/// [`Buffering`] mode selects which driver it implements.
///
/// # Durability
///
/// - `flush()` writes staged bytes and calls `File::flush()`
/// - `sync()` additionally calls `File::sync_all()`
///
/// # Example
///
/// ```no_run
/// use h5file_storage::{Access, Buffering, FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend =
///     FileBackend::open(Path::new("data.h5"), Access::Truncate, Buffering::Direct).unwrap();
/// backend.append(b"persistent data").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    file: RwLock<File>,
    /// Logical size, staged bytes included.
    size: RwLock<u64>,
    /// Bytes appended but not yet written (`stdio` only).
    pending: RwLock<Vec<u8>>,
    buffering: Buffering,
    writable: bool,
}

impl FileBackend {
    /// Opens a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when a non-creating access finds no
    /// file, [`StorageError::AlreadyExists`] when [`Access::CreateNew`] finds
    /// one, and [`StorageError::Io`] for anything else.
    pub fn open(path: &Path, access: Access, buffering: Buffering) -> StorageResult<Self> {
        let file = open_file(path, access)?;
        let size = file.metadata()?.len();

        tracing::debug!(path = %path.display(), ?access, ?buffering, size, "opened file backend");

        Ok(Self {
            file: RwLock::new(file),
            size: RwLock::new(size),
            pending: RwLock::new(Vec::new()),
            buffering,
            writable: access.is_writable(),
        })
    }

    /// Writes staged bytes to the end of the file.
    fn drain_pending(file: &mut File, pending: &mut Vec<u8>) -> StorageResult<()> {
        if pending.is_empty() {
            return Ok(());
        }
        file.seek(SeekFrom::End(0))?;
        file.write_all(pending)?;
        pending.clear();
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut file = self.file.write();
        let size = *self.size.read();
        let pending = self.pending.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let persisted = size - pending.len() as u64;
        let mut buffer = Vec::with_capacity(len);

        if offset < persisted {
            let on_disk = (end.min(persisted) - offset) as usize;
            let mut chunk = vec![0u8; on_disk];
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut chunk)?;
            buffer.extend_from_slice(&chunk);
        }

        if end > persisted {
            let start = offset.max(persisted) - persisted;
            let stop = end - persisted;
            buffer.extend_from_slice(&pending[start as usize..stop as usize]);
        }

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }
        if data.is_empty() {
            return Ok(*self.size.read());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();
        let mut pending = self.pending.write();

        let offset = *size;
        match self.buffering {
            Buffering::Direct => {
                file.seek(SeekFrom::End(0))?;
                file.write_all(data)?;
            }
            Buffering::Buffered => {
                pending.extend_from_slice(data);
                if pending.len() >= STDIO_BUFFER_SIZE {
                    Self::drain_pending(&mut file, &mut pending)?;
                }
            }
        }
        *size += data.len() as u64;

        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if !self.writable {
            return Ok(());
        }
        let mut file = self.file.write();
        let mut pending = self.pending.write();
        Self::drain_pending(&mut file, &mut pending)?;
        file.flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.flush()?;
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }

        let mut file = self.file.write();
        let mut size = self.size.write();
        let mut pending = self.pending.write();

        if new_size > *size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, *size
                ),
            )));
        }

        Self::drain_pending(&mut file, &mut pending)?;
        file.set_len(new_size)?;
        file.sync_all()?;
        *size = new_size;

        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn driver_name(&self) -> &'static str {
        match self.buffering {
            Buffering::Direct => "sec2",
            Buffering::Buffered => "stdio",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let backend = FileBackend::open(&path, Access::CreateNew, Buffering::Direct).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_create_new_rejects_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");
        std::fs::write(&path, b"keep me").unwrap();

        let result = FileBackend::open(&path, Access::CreateNew, Buffering::Direct);
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn file_open_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.h5");

        let result = FileBackend::open(&path, Access::ReadOnly, Buffering::Direct);
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        let result = FileBackend::open(&path, Access::ReadWrite, Buffering::Direct);
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn file_truncate_access_discards_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");
        std::fs::write(&path, b"old content").unwrap();

        let backend = FileBackend::open(&path, Access::Truncate, Buffering::Direct).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
    }

    #[test]
    fn file_append_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let mut backend = FileBackend::open(&path, Access::Truncate, Buffering::Direct).unwrap();

        let offset1 = backend.append(b"hello").unwrap();
        assert_eq!(offset1, 0);

        let offset2 = backend.append(b" world").unwrap();
        assert_eq!(offset2, 5);

        assert_eq!(backend.size().unwrap(), 11);

        let data = backend.read_at(0, 11).unwrap();
        assert_eq!(&data, b"hello world");
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let mut backend = FileBackend::open(&path, Access::Truncate, Buffering::Direct).unwrap();
        backend.append(b"hello").unwrap();

        let result = backend.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");
        std::fs::write(&path, b"abc").unwrap();

        let mut backend = FileBackend::open(&path, Access::ReadOnly, Buffering::Direct).unwrap();
        assert!(!backend.is_writable());
        assert!(matches!(backend.append(b"x"), Err(StorageError::ReadOnly)));
        assert!(matches!(backend.truncate(0), Err(StorageError::ReadOnly)));
        assert_eq!(backend.read_at(0, 3).unwrap(), b"abc");
    }

    #[test]
    fn stdio_reads_see_staged_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let mut backend = FileBackend::open(&path, Access::Truncate, Buffering::Buffered).unwrap();
        backend.append(b"hello").unwrap();
        backend.flush().unwrap();
        backend.append(b" world").unwrap();

        // " world" is still staged
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 5);
        assert_eq!(backend.read_at(0, 11).unwrap(), b"hello world");
        assert_eq!(backend.read_at(3, 5).unwrap(), b"lo wo");
        assert_eq!(backend.read_at(6, 5).unwrap(), b"world");

        backend.flush().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn stdio_drains_large_buffers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let mut backend = FileBackend::open(&path, Access::Truncate, Buffering::Buffered).unwrap();
        backend.append(&vec![7u8; STDIO_BUFFER_SIZE]).unwrap();
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            STDIO_BUFFER_SIZE as u64
        );
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        {
            let mut backend =
                FileBackend::open(&path, Access::Truncate, Buffering::Buffered).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.close().unwrap();
        }

        {
            let backend = FileBackend::open(&path, Access::ReadOnly, Buffering::Direct).unwrap();
            assert_eq!(backend.size().unwrap(), 15);
            assert_eq!(backend.read_at(0, 15).unwrap(), b"persistent data");
        }
    }

    #[test]
    fn truncate_drops_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let mut backend = FileBackend::open(&path, Access::Truncate, Buffering::Buffered).unwrap();
        backend.append(b"hello world").unwrap();
        backend.truncate(5).unwrap();
        assert_eq!(backend.size().unwrap(), 5);
        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
        assert!(backend.truncate(100).is_err());
    }

    #[test]
    fn driver_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.h5");

        let sec2 = FileBackend::open(&path, Access::Truncate, Buffering::Direct).unwrap();
        assert_eq!(sec2.driver_name(), "sec2");
        drop(sec2);

        let stdio = FileBackend::open(&path, Access::ReadWrite, Buffering::Buffered).unwrap();
        assert_eq!(stdio.driver_name(), "stdio");
    }
}
