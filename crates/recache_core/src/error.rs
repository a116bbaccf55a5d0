//! Error types for recache core.

use recache_codec::ValueKind;
use thiserror::Error;

/// Result type for core operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while serializing, filtering or sorting records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] recache_codec::CodecError),

    /// The type identifier of a cache entry is not registered.
    #[error("unknown record type: {type_name}")]
    UnknownType {
        /// The unresolved type identifier.
        type_name: String,
    },

    /// A filter or sort referenced an attribute the record type does not declare.
    #[error("unknown attribute {attribute} on record type {type_name}")]
    UnknownAttribute {
        /// Type identifier of the record.
        type_name: String,
        /// The attribute that was requested.
        attribute: String,
    },

    /// Two values under one sort key cannot be ordered against each other.
    #[error("cannot order {left} against {right} for attribute {attribute}")]
    TypeMismatch {
        /// The sort key.
        attribute: String,
        /// Kind of the first value seen under the key.
        left: ValueKind,
        /// Kind of the conflicting value.
        right: ValueKind,
    },

    /// A cache entry does not have the expected envelope shape.
    #[error("invalid cache entry: {message}")]
    InvalidEntry {
        /// Description of the problem.
        message: String,
    },

    /// A cache entry was written with a different envelope version.
    #[error("unsupported cache entry version: expected {expected}, got {actual}")]
    UnsupportedVersion {
        /// Version this build reads.
        expected: u64,
        /// Version found in the entry.
        actual: u64,
    },

    /// An encoded attribute could not be decoded.
    #[error("failed to decode attribute {attribute}: {message}")]
    DecodeFailed {
        /// The encoded attribute.
        attribute: String,
        /// Description of the failure.
        message: String,
    },

    /// A textual sort order could not be parsed.
    #[error("invalid sort order: {fragment:?}")]
    InvalidSortOrder {
        /// The offending text.
        fragment: String,
    },
}

impl CacheError {
    /// Creates an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(attribute: impl Into<String>, left: ValueKind, right: ValueKind) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            left,
            right,
        }
    }

    /// Creates an invalid entry error.
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            message: message.into(),
        }
    }

    /// Creates a decode failed error.
    pub fn decode_failed(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid sort order error.
    pub fn invalid_sort_order(fragment: impl Into<String>) -> Self {
        Self::InvalidSortOrder {
            fragment: fragment.into(),
        }
    }
}
