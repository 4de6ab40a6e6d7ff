//! # h5file Core
//!
//! Container handle management for h5file.
//!
//! This crate provides:
//! - Open-mode resolution (`r`, `r+`, `w`, `w-`/`x`, `a`)
//! - Driver selection and option validation (`sec2`, `stdio`, `core`, `family`)
//! - Format-compatibility bounds
//! - Shared container handles whose aliases observe each other's close
//! - A minimal group hierarchy for exercising the above
//!
//! ## Example
//!
//! ```rust,no_run
//! use h5file_core::{open, Container, DriverOptions};
//!
//! let options = DriverOptions::new().with("backing_store", true);
//! let file = open("scratch.h5", "w", Some("core"), &options, Some("latest".into()))?;
//! file.create_group("results")?;
//! file.close()?;
//!
//! let file = Container::open("scratch.h5", "r")?;
//! assert!(file.contains("results"));
//! assert_eq!(file.mode().as_str(), "r");
//! # Ok::<(), h5file_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod container;
mod driver;
mod engine;
mod error;
mod group;
mod libver;
mod mode;

pub use config::Config;
pub use container::{open, Container, HandleRef};
pub use driver::{DriverOption, DriverOptions, DriverSpec, PLATFORM_DEFAULT_DRIVER};
pub use engine::{Catalog, ContainerId, SUPERBLOCK_MAGIC, SUPERBLOCK_SIZE};
pub use error::{CoreError, CoreResult};
pub use group::Group;
pub use libver::{normalize, Libver, VersionBounds, VersionTag};
pub use mode::{AccessMode, Mode, OpenFlags};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
