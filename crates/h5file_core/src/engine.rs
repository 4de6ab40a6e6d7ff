//! Minimal container engine.
//!
//! A container is a superblock followed by a log of catalog records:
//!
//! ```text
//! +----------------------------+
//! | magic (8)                  |
//! | superblock revision (2)    |
//! | low tag (1) | high tag (1) |
//! | reserved (4)               |
//! +----------------------------+
//! | len (4) | CBOR catalog | sha256 (32) |   record 0
//! | len (4) | CBOR catalog | sha256 (32) |   record 1
//! | ...                                  |
//! ```
//!
//! The last complete record is the current catalog. A torn tail (a record
//! cut short by a crash) is ignored; a complete record with a bad digest is
//! corruption.

use crate::libver::{VersionBounds, VersionTag};
use h5file_storage::{StorageBackend, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Magic bytes at the start of every container.
pub const SUPERBLOCK_MAGIC: [u8; 8] = *b"\x89H5F\r\n\x1a\n";

/// Size of the superblock in bytes.
pub const SUPERBLOCK_SIZE: usize = 16;

/// Record length prefix size.
const LEN_SIZE: usize = 4;

/// Record digest size.
const DIGEST_SIZE: usize = 32;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque engine identifier of an open container.
///
/// Identifiers are unique within the process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fid:{}", self.0)
    }
}

/// The persistent object directory of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Lower compatibility bound recorded at creation.
    pub low: VersionTag,
    /// Upper compatibility bound recorded at creation.
    pub high: VersionTag,
    /// Absolute paths of all groups below the root.
    pub groups: BTreeSet<String>,
    /// Number of records written before this one. In memory it counts
    /// every record in the log so far.
    pub generation: u64,
}

impl Catalog {
    fn new(bounds: VersionBounds) -> Self {
        Self {
            low: bounds.low(),
            high: bounds.high(),
            groups: BTreeSet::new(),
            generation: 0,
        }
    }
}

/// A live container: its storage backend plus the in-memory catalog.
pub struct Engine {
    id: ContainerId,
    backend: Box<dyn StorageBackend>,
    catalog: Catalog,
    dirty: bool,
}

impl Engine {
    /// Initializes a fresh container on an empty backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the superblock or first record cannot be written.
    pub fn create(mut backend: Box<dyn StorageBackend>, bounds: VersionBounds) -> StorageResult<Self> {
        let mut superblock = [0u8; SUPERBLOCK_SIZE];
        superblock[..8].copy_from_slice(&SUPERBLOCK_MAGIC);
        superblock[8..10].copy_from_slice(&bounds.low().superblock_revision().to_le_bytes());
        superblock[10] = bounds.low().code();
        superblock[11] = bounds.high().code();
        backend.append(&superblock)?;

        let mut engine = Self {
            id: ContainerId::next(),
            backend,
            catalog: Catalog::new(bounds),
            dirty: true,
        };
        engine.commit()?;
        Ok(engine)
    }

    /// Loads an existing container.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] for a bad superblock, a digest
    /// mismatch, an undecodable record, or a log without any record.
    ///
    /// A torn tail is cut off when the backend is writable, so the next
    /// record lands directly after the last complete one.
    pub fn load(mut backend: Box<dyn StorageBackend>) -> StorageResult<Self> {
        let size = backend.size()?;
        if size < SUPERBLOCK_SIZE as u64 {
            return Err(StorageError::Corrupted(format!(
                "file too small for a superblock ({size} bytes)"
            )));
        }

        let superblock = backend.read_at(0, SUPERBLOCK_SIZE)?;
        if superblock[..8] != SUPERBLOCK_MAGIC {
            return Err(StorageError::Corrupted("bad superblock signature".to_string()));
        }
        let low = VersionTag::from_code(superblock[10]);
        let high = VersionTag::from_code(superblock[11]);
        let (Some(low), Some(high)) = (low, high) else {
            return Err(StorageError::Corrupted(format!(
                "unknown version tags {}/{} in superblock",
                superblock[10], superblock[11]
            )));
        };
        if low > high {
            return Err(StorageError::Corrupted(format!(
                "superblock bounds out of order ({low}, {high})"
            )));
        }

        let mut offset = SUPERBLOCK_SIZE as u64;
        let mut catalog = None;
        let mut records = 0u64;
        while offset + LEN_SIZE as u64 <= size {
            let len_bytes = backend.read_at(offset, LEN_SIZE)?;
            let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
                as usize;
            let record_end = offset + (LEN_SIZE + len + DIGEST_SIZE) as u64;
            if record_end > size {
                tracing::warn!(offset, size, "ignoring torn catalog record");
                break;
            }

            let payload = backend.read_at(offset + LEN_SIZE as u64, len)?;
            let digest = backend.read_at(offset + (LEN_SIZE + len) as u64, DIGEST_SIZE)?;
            if Sha256::digest(&payload).as_slice() != digest.as_slice() {
                return Err(StorageError::Corrupted(format!(
                    "catalog record at offset {offset} failed its checksum"
                )));
            }

            let decoded: Catalog = ciborium::from_reader(payload.as_slice())
                .map_err(|e| StorageError::Corrupted(format!("undecodable catalog: {e}")))?;
            catalog = Some(decoded);
            records += 1;
            offset = record_end;
        }

        let mut catalog =
            catalog.ok_or_else(|| StorageError::Corrupted("no catalog record".to_string()))?;
        // The superblock is authoritative for the bounds.
        catalog.low = low;
        catalog.high = high;
        catalog.generation = records;

        if offset < size && backend.is_writable() {
            tracing::info!(offset, size, "trimming torn catalog tail");
            backend.truncate(offset)?;
        }

        Ok(Self {
            id: ContainerId::next(),
            backend,
            catalog,
            dirty: false,
        })
    }

    /// Returns the engine identifier.
    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    /// Returns the current catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the compatibility bounds stored in the container.
    #[must_use]
    pub fn stored_bounds(&self) -> VersionBounds {
        VersionBounds::new(self.catalog.low, self.catalog.high)
            .unwrap_or(VersionBounds::single(self.catalog.low))
    }

    /// Returns true if a group exists at the absolute `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        path == "/" || self.catalog.groups.contains(path)
    }

    /// Records a new group. Returns false if it already existed.
    pub fn insert_group(&mut self, path: &str) -> bool {
        let inserted = self.catalog.groups.insert(path.to_string());
        self.dirty |= inserted;
        inserted
    }

    /// Returns the size of the underlying storage.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error.
    pub fn size(&self) -> StorageResult<u64> {
        self.backend.size()
    }

    /// Appends the catalog if it changed, then flushes the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn commit(&mut self) -> StorageResult<()> {
        if self.dirty && self.backend.is_writable() {
            let mut payload = Vec::new();
            ciborium::into_writer(&self.catalog, &mut payload)
                .map_err(|e| StorageError::Corrupted(format!("unencodable catalog: {e}")))?;
            let len = u32::try_from(payload.len()).map_err(|_| {
                StorageError::Corrupted(format!("catalog of {} bytes is too large", payload.len()))
            })?;

            let mut record = Vec::with_capacity(LEN_SIZE + payload.len() + DIGEST_SIZE);
            record.extend_from_slice(&len.to_le_bytes());
            record.extend_from_slice(&payload);
            record.extend_from_slice(&Sha256::digest(&payload));
            self.backend.append(&record)?;

            self.catalog.generation += 1;
            self.dirty = false;
        }
        if self.backend.is_writable() {
            self.backend.flush()?;
        }
        Ok(())
    }

    /// Commits pending changes, syncs writable storage and releases the
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns the first error from committing, syncing or closing.
    pub fn close(mut self) -> StorageResult<()> {
        self.commit()?;
        if self.backend.is_writable() {
            self.backend.sync()?;
        }
        self.backend.close()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("driver", &self.backend.driver_name())
            .field("groups", &self.catalog.groups.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
