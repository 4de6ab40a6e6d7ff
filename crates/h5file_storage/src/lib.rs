//! # h5file Storage
//!
//! Low-level storage drivers for h5file containers.
//!
//! A driver decides *how* the bytes of a container reach the operating
//! system. Backends are **opaque byte stores**: they never interpret the
//! container format layered on top of them.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - `sec2` (unbuffered positional I/O) and `stdio`
//!   (buffered writes) drivers over a single OS file
//! - [`CoreBackend`] - `core` driver, keeps the whole image in memory with an
//!   optional backing file written on flush and close
//! - [`FamilyBackend`] - `family` driver, splits the address space across
//!   numbered member files of a fixed size
//!
//! ## Example
//!
//! ```rust
//! use h5file_storage::{CoreBackend, StorageBackend};
//!
//! let mut backend = CoreBackend::anonymous(4096);
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod family;
mod file;
mod memory;

pub use backend::{Access, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use family::{FamilyBackend, DEFAULT_MEMBER_SIZE, MEMBER_PLACEHOLDER};
pub use file::{Buffering, FileBackend};
pub use memory::{CoreBackend, DEFAULT_BLOCK_SIZE};
