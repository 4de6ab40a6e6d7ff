//! # h5file Testkit
//!
//! Test utilities for h5file.
//!
//! This crate provides:
//! - Temporary container fixtures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use h5file_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_container() {
//!     with_temp_container(|file| {
//!         file.create_group("test").unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
