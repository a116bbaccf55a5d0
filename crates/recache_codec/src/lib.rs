//! # recache codec
//!
//! Dynamic attribute values and their canonical CBOR encoding.
//!
//! Cached records travel to the external cache store as bytes. This crate
//! provides the [`Value`] type every record attribute is expressed in and a
//! deterministic CBOR encoding for it:
//!
//! - Maps are sorted by key (length-first, then bytewise)
//! - Integers use shortest encoding
//! - Floats are 64-bit, NaN is rejected
//! - Timestamps are tag 0 RFC 3339 strings
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use recache_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let value = Value::from("Green Apple");
//! let bytes = to_canonical_cbor(&value).unwrap();
//!
//! let decoded: Value = from_cbor(&bytes).unwrap();
//! assert_eq!(value, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{encode_into, to_canonical_cbor};
pub use error::{CodecError, CodecResult};
pub use value::{Value, ValueKind};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            any::<f64>()
                .prop_filter("NaN is not encodable", |f| !f.is_nan())
                .prop_map(Value::Float),
            ".{0,16}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        ]
    }

    proptest! {
        #[test]
        fn scalars_survive_encoding(value in scalar()) {
            let bytes = to_canonical_cbor(&value).unwrap();
            prop_assert_eq!(from_cbor(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn attribute_map_survives_encoding() {
        let value = Value::map(vec![
            (Value::from("name"), Value::from("Green Apple")),
            (Value::from("price"), Value::Float(0.49)),
            (Value::from("stock"), Value::Integer(12)),
            (Value::from("updated_at"), Value::Null),
        ]);
        let bytes = to_canonical_cbor(&value).unwrap();
        let decoded: Value = from_cbor(&bytes).unwrap();
        assert_eq!(value, decoded);
    }
}
