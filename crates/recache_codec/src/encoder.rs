//! Canonical CBOR encoder.
//!
//! Output follows the deterministic encoding rules of RFC 8949 §4.2.1, so
//! equal values always produce equal bytes. Two choices go beyond the RFC:
//! floats are always written as 64-bit so cached values come back
//! bit-identical, and timestamps use tag 0 with an RFC 3339 string.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use chrono::SecondsFormat;

/// CBOR tag for an RFC 3339 date/time string.
pub(crate) const TAG_DATETIME_TEXT: u64 = 0;
/// CBOR tag for epoch-based date/time.
pub(crate) const TAG_DATETIME_EPOCH: u64 = 1;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;

const SIMPLE_FALSE: u8 = 0xf4;
const SIMPLE_TRUE: u8 = 0xf5;
const SIMPLE_NULL: u8 = 0xf6;
const FLOAT64: u8 = 0xfb;

/// Encodes a value to canonical CBOR bytes.
///
/// # Errors
///
/// Returns `NaNForbidden` if the value contains a NaN float.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

/// Appends the canonical encoding of `value` to `out`.
///
/// On error `out` may hold a partial encoding.
///
/// # Errors
///
/// Returns `NaNForbidden` if the value contains a NaN float.
pub fn encode_into(value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
    match value {
        Value::Null => out.push(SIMPLE_NULL),
        Value::Bool(b) => out.push(if *b { SIMPLE_TRUE } else { SIMPLE_FALSE }),
        Value::Integer(n) => write_integer(out, *n),
        Value::Float(f) => {
            if f.is_nan() {
                return Err(CodecError::NaNForbidden);
            }
            out.push(FLOAT64);
            out.extend_from_slice(&f.to_be_bytes());
        }
        Value::Bytes(bytes) => write_string(out, MAJOR_BYTES, bytes),
        Value::Text(text) => write_string(out, MAJOR_TEXT, text.as_bytes()),
        Value::Timestamp(t) => {
            write_head(out, MAJOR_TAG, TAG_DATETIME_TEXT);
            let text = t.to_rfc3339_opts(SecondsFormat::AutoSi, true);
            write_string(out, MAJOR_TEXT, text.as_bytes());
        }
        Value::Array(items) => {
            write_head(out, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                encode_into(item, out)?;
            }
        }
        Value::Map(pairs) => write_map(out, pairs)?,
    }
    Ok(())
}

/// Sort key for a map key: its encoded length, then its encoded bytes.
pub(crate) fn canonical_key(key: &Value) -> (usize, Vec<u8>) {
    let bytes = to_canonical_cbor(key).unwrap_or_default();
    (bytes.len(), bytes)
}

/// Writes a major type with its argument in the shortest form.
#[allow(clippy::cast_possible_truncation)]
fn write_head(out: &mut Vec<u8>, major: u8, argument: u64) {
    let major = major << 5;
    match argument {
        0..=23 => out.push(major | argument as u8),
        24..=0xff => out.extend_from_slice(&[major | 24, argument as u8]),
        0x100..=0xffff => {
            out.push(major | 25);
            out.extend_from_slice(&(argument as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major | 26);
            out.extend_from_slice(&(argument as u32).to_be_bytes());
        }
        _ => {
            out.push(major | 27);
            out.extend_from_slice(&argument.to_be_bytes());
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn write_integer(out: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        write_head(out, MAJOR_UNSIGNED, n as u64);
    } else {
        // -1 - n never overflows for negative n
        write_head(out, MAJOR_NEGATIVE, (-1 - n) as u64);
    }
}

fn write_string(out: &mut Vec<u8>, major: u8, bytes: &[u8]) {
    write_head(out, major, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn write_map(out: &mut Vec<u8>, pairs: &[(Value, Value)]) -> CodecResult<()> {
    let mut entries = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        entries.push((to_canonical_cbor(key)?, value));
    }
    entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    write_head(out, MAJOR_MAP, entries.len() as u64);
    for (key, value) in entries {
        out.extend_from_slice(&key);
        encode_into(value, out)?;
    }
    Ok(())
}
