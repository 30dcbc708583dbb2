//! UID Common - Identifier rendering shared by the reader and the CLI

use std::fmt;

/// Placeholder shown when a tag's identifier could not be read
pub const UNKNOWN: &str = "UNKNOWN";

/// Prefix of every line reported for a presented tag
pub const UID_PREFIX: &str = "UID:";

/// Render identifier bytes as uppercase hex with no separators
///
/// # Arguments
/// * `identifier` - The raw identifier bytes as returned by the card
///
/// # Returns
/// * `String` - e.g. `04A19C3B` for `[0x04, 0xA1, 0x9C, 0x3B]`
pub fn format_identifier(identifier: &[u8]) -> String {
    hex::encode_upper(identifier)
}

/// Canonical form of a UID string typed or pasted by a person
///
/// Surrounding whitespace is dropped and hex digits are uppercased, so
/// ` 04a19c3b\n` and `04A19C3B` name the same card.
pub fn normalize_uid(uid: &str) -> String {
    uid.trim().to_uppercase()
}

/// One reported UID line
///
/// `Display` yields `UID: <HEX>`, or `UID: UNKNOWN` when the identifier
/// could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidLine {
    /// Identifier was read
    Known(Vec<u8>),
    /// Identifier extraction failed for any reason
    Unknown,
}

impl UidLine {
    /// Build a line from an extraction result, discarding the failure cause
    pub fn from_result<E>(result: Result<Vec<u8>, E>) -> Self {
        match result {
            Ok(identifier) => UidLine::Known(identifier),
            Err(_) => UidLine::Unknown,
        }
    }

    /// The value part of the line (hex string or placeholder)
    pub fn value(&self) -> String {
        match self {
            UidLine::Known(identifier) => format_identifier(identifier),
            UidLine::Unknown => UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for UidLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", UID_PREFIX, self.value())
    }
}
