//! Multi-file storage backend for the `family` driver.
//!
//! The logical address space is cut into fixed-size members. Member `n`
//! covers bytes `[n * member_size, (n + 1) * member_size)` and lives in the
//! file obtained by substituting `n` for [`MEMBER_PLACEHOLDER`] in the
//! container path. Every member but the last is always full.

use crate::backend::{Access, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::file::open_file;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Marker substituted with the member index in family paths.
pub const MEMBER_PLACEHOLDER: &str = "%d";

/// Default member size (64 MiB).
pub const DEFAULT_MEMBER_SIZE: u64 = 64 * 1024 * 1024;

/// A storage backend spread over numbered member files.
///
/// # Example
///
/// ```no_run
/// use h5file_storage::{Access, FamilyBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend =
///     FamilyBackend::open(Path::new("data-%d.h5"), Access::Truncate, 1024).unwrap();
/// backend.append(&[0u8; 3000]).unwrap(); // data-0.h5, data-1.h5, data-2.h5
/// ```
#[derive(Debug)]
pub struct FamilyBackend {
    pattern: String,
    member_size: u64,
    members: Mutex<Vec<File>>,
    size: u64,
    writable: bool,
}

impl FamilyBackend {
    /// Opens a family whose member paths follow `pattern`.
    ///
    /// Non-creating accesses require member 0 and pick up every consecutive
    /// member after it. Creating accesses start from an empty member 0;
    /// [`Access::Truncate`] also removes stale members left by an earlier,
    /// larger family.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if the pattern lacks the member
    /// placeholder or `member_size` is zero, [`StorageError::Corrupted`] if a
    /// non-final member is short, and the usual open errors otherwise.
    pub fn open(pattern: &Path, access: Access, member_size: u64) -> StorageResult<Self> {
        let pattern = pattern
            .to_str()
            .filter(|p| p.contains(MEMBER_PLACEHOLDER))
            .ok_or_else(|| {
                StorageError::InvalidPath(format!(
                    "family path must contain '{MEMBER_PLACEHOLDER}': {}",
                    pattern.display()
                ))
            })?
            .to_string();
        if member_size == 0 {
            return Err(StorageError::InvalidPath(
                "family member size must be positive".to_string(),
            ));
        }

        let first = member_path(&pattern, 0);
        let mut members = vec![open_file(&first, access)?];

        if access.is_create() {
            if access == Access::Truncate {
                remove_members_from(&pattern, 1)?;
            }
        } else {
            let member_access = if access.is_writable() {
                Access::ReadWrite
            } else {
                Access::ReadOnly
            };
            let mut index = 1;
            loop {
                let path = member_path(&pattern, index);
                if !path.exists() {
                    break;
                }
                members.push(open_file(&path, member_access)?);
                index += 1;
            }
        }

        let mut size = 0;
        let last = members.len() - 1;
        for (index, member) in members.iter().enumerate() {
            let len = member.metadata()?.len();
            if index < last && len != member_size {
                return Err(StorageError::Corrupted(format!(
                    "family member {index} holds {len} bytes, expected {member_size}"
                )));
            }
            size += len;
        }

        tracing::debug!(%pattern, ?access, member_size, members = members.len(), size, "opened family backend");

        Ok(Self {
            pattern,
            member_size,
            members: Mutex::new(members),
            size,
            writable: access.is_writable(),
        })
    }

}

fn member_path(pattern: &str, index: usize) -> PathBuf {
    PathBuf::from(pattern.replacen(MEMBER_PLACEHOLDER, &index.to_string(), 1))
}

fn remove_members_from(pattern: &str, start: usize) -> StorageResult<()> {
    let mut index = start;
    loop {
        let path = member_path(pattern, index);
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_file(&path)?;
        index += 1;
    }
}

impl StorageBackend for FamilyBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let end = offset.saturating_add(len as u64);
        if offset > self.size || end > self.size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.size,
            });
        }

        let mut members = self.members.lock();
        let mut buffer = vec![0u8; len];
        let mut position = offset;
        let mut filled = 0;

        while position < end {
            let index = (position / self.member_size) as usize;
            let within = position % self.member_size;
            let chunk = (self.member_size - within).min(end - position) as usize;

            let member = &mut members[index];
            member.seek(SeekFrom::Start(within))?;
            member.read_exact(&mut buffer[filled..filled + chunk])?;

            filled += chunk;
            position += chunk as u64;
        }

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }

        let offset = self.size;
        let members = self.members.get_mut();
        let mut written = 0;

        while written < data.len() {
            let position = self.size + written as u64;
            let index = (position / self.member_size) as usize;
            if index == members.len() {
                let path = member_path(&self.pattern, index);
                members.push(open_file(&path, Access::Truncate)?);
            }
            let within = position % self.member_size;
            let chunk = ((self.member_size - within) as usize).min(data.len() - written);

            let member = &mut members[index];
            member.seek(SeekFrom::Start(within))?;
            member.write_all(&data[written..written + chunk])?;
            written += chunk;
        }

        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if !self.writable {
            return Ok(());
        }
        for member in self.members.get_mut().iter_mut() {
            member.flush()?;
        }
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }

    fn sync(&mut self) -> StorageResult<()> {
        for member in self.members.get_mut().iter_mut() {
            member.sync_all()?;
        }
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }
        if new_size > self.size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, self.size
                ),
            )));
        }

        // Member 0 always survives, even when empty.
        let keep = (new_size.div_ceil(self.member_size) as usize).max(1);
        let members = self.members.get_mut();
        members.truncate(keep);
        remove_members_from(&self.pattern, keep)?;

        let last = members.len() - 1;
        let last_len = new_size - last as u64 * self.member_size;
        members[last].set_len(last_len)?;
        self.size = new_size;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn driver_name(&self) -> &'static str {
        "family"
    }
}
