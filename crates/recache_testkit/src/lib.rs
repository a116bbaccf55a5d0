//! # recache testkit
//!
//! Test utilities for recache.
//!
//! This crate provides:
//! - Fixture record types and sample data
//! - Property-based test generators using proptest
//!
//! The property and integration tests for the whole workspace live in this
//! crate's `tests/` directory.
//!
//! ## Usage
//!
//! ```
//! use recache_testkit::prelude::*;
//!
//! let registry = registry();
//! let apples = sample_apples(&registry);
//! assert_eq!(ids(&apples), vec![1, 2, 3, 4, 5]);
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
