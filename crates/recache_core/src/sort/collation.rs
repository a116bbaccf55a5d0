//! Locale-independent, case-insensitive string collation.
//!
//! A collation key is built in four steps:
//!
//! 1. repair malformed UTF-8 (byte input only)
//! 2. NFC-normalize
//! 3. transliterate each character to its base Latin form
//!    (`é` → `e`, `ß` → `ss`, `Ø` → `O`)
//! 4. lower-case the transliterated text
//!
//! A character with no transliteration is kept exactly as it was after
//! normalization, case included, at the same position. Scripts without a
//! Latin form therefore sort by their own code points.

use std::collections::HashMap;
use std::sync::Arc;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Computes the collation key of a string without caching.
///
/// ```
/// use recache_core::collation_key;
///
/// assert_eq!(collation_key("Crème Brûlée"), "creme brulee");
/// assert_eq!(collation_key("Straße"), "strasse");
/// assert_eq!(collation_key("東京"), "東京");
/// assert_eq!(collation_key("ΩMEGA"), "Ωmega");
/// ```
pub fn collation_key(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let mut key = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        let start = key.len();
        if transliterate_into(c, &mut key) {
            key[start..].make_ascii_lowercase();
        } else {
            key.push(c);
        }
    }
    key
}

/// Computes the collation key of raw bytes, repairing invalid UTF-8 first.
pub fn collation_key_bytes(bytes: &[u8]) -> String {
    collation_key(&String::from_utf8_lossy(bytes))
}

/// Appends the base Latin form of `c`. Returns false if there is none.
fn transliterate_into(c: char, out: &mut String) -> bool {
    if c.is_ascii() {
        out.push(c);
        return true;
    }

    if let Some(expansion) = latin_expansion(c) {
        out.push_str(expansion);
        return true;
    }

    let base: String = std::iter::once(c).nfd().filter(|&m| !is_combining_mark(m)).collect();
    if !base.is_empty() && base.is_ascii() {
        out.push_str(&base);
        return true;
    }

    false
}

/// Letters that do not decompose into a base letter plus marks.
fn latin_expansion(c: char) -> Option<&'static str> {
    let expansion = match c {
        'ß' => "ss",
        'ẞ' => "SS",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        'Ø' => "O",
        'ø' => "o",
        'Đ' | 'Ð' => "D",
        'đ' | 'ð' => "d",
        'Ł' => "L",
        'ł' => "l",
        'Þ' => "TH",
        'þ' => "th",
        'Ħ' => "H",
        'ħ' => "h",
        'ı' => "i",
        'Ŋ' => "N",
        'ŋ' => "n",
        'ĸ' => "k",
        'ſ' => "s",
        // Typographic punctuation
        '\u{2018}' | '\u{2019}' | '\u{201A}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' => "\"",
        '\u{2013}' | '\u{2014}' => "-",
        '\u{00A0}' => " ",
        _ => return None,
    };
    Some(expansion)
}

/// Call-scoped cache of collation keys.
///
/// One `Collator` lives for the duration of one sort. Keys are memoized by
/// string content, so repeated values across records are collated once.
/// Dropping or [`clear`](Collator::clear)ing the collator discards every key.
#[derive(Debug, Default)]
pub struct Collator {
    keys: HashMap<String, Arc<str>>,
}

impl Collator {
    /// Creates an empty collator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collation key of `text`, computing it at most once.
    pub fn collate(&mut self, text: &str) -> Arc<str> {
        if let Some(key) = self.keys.get(text) {
            return Arc::clone(key);
        }
        let key: Arc<str> = collation_key(text).into();
        self.keys.insert(text.to_string(), Arc::clone(&key));
        key
    }

    /// Returns the collation key of raw bytes, repairing invalid UTF-8.
    ///
    /// Shares the cache with [`collate`](Collator::collate): bytes that
    /// repair to an already collated string reuse its key.
    pub fn collate_bytes(&mut self, bytes: &[u8]) -> Arc<str> {
        let text = String::from_utf8_lossy(bytes);
        if let Some(key) = self.keys.get(text.as_ref()) {
            return Arc::clone(key);
        }
        let key: Arc<str> = collation_key_bytes(bytes).into();
        self.keys.insert(text.into_owned(), Arc::clone(&key));
        key
    }

    /// Returns the number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys are cached.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Discards every cached key, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let cleared = self.keys.len();
        self.keys.clear();
        cleared
    }
}
