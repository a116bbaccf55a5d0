//! # recache core
//!
//! In-memory record cache engine.
//!
//! This crate provides:
//! - Serialization of records into association-free cache entries and back
//! - Filtering of cached records by equality and membership predicates
//! - Multi-key sorting with case- and accent-insensitive text collation
//! - A thread-safe registry of record types
//!
//! Results are meant to match what the database would have returned for
//! the same `WHERE` / `ORDER BY` query, so that a cache hit and a cache
//! miss are indistinguishable to the caller.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod filter;
mod record;
mod registry;
mod serializer;
mod sort;

pub use config::Config;
pub use engine::Engine;
pub use error::{CacheError, CacheResult};
pub use filter::{filter, Predicate, Predicates};
pub use record::{
    Attributes, Column, EncodedFormat, FromSnapshot, Record, Row, Schema, StorageType,
};
pub use registry::TypeRegistry;
pub use serializer::{deserialize, serialize, CacheEntry, ENTRY_FORMAT_VERSION};
pub use sort::{collation_key, collation_key_bytes, sort, Collator, SortOrder};

pub use recache_codec::{Value, ValueKind};
