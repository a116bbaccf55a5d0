//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an [`Engine`](crate::Engine).
///
/// Derives serde so the surrounding cache layer can load it from whatever
/// format it keeps its settings in. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether filters compare text case-insensitively.
    pub case_insensitive: bool,

    /// Whether sorts compare textual columns by collation key
    /// instead of the raw string.
    pub collate_text: bool,

    /// Whether deserialize runs the decode step for encoded attributes.
    pub decode_encoded_attributes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            collate_text: true,
            decode_encoded_attributes: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether filters compare text case-insensitively.
    #[must_use]
    pub const fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    /// Sets whether sorts use collation keys for textual columns.
    #[must_use]
    pub const fn collate_text(mut self, value: bool) -> Self {
        self.collate_text = value;
        self
    }

    /// Sets whether encoded attributes are decoded on deserialize.
    #[must_use]
    pub const fn decode_encoded_attributes(mut self, value: bool) -> Self {
        self.decode_encoded_attributes = value;
        self
    }
}
