//! Transport selector parsing
//!
//! A selector names the reader to open, e.g. `usb` for the first reader or
//! `usb:ACR122` for the first reader whose name contains `ACR122`.

use std::ffi::CStr;
use std::fmt;
use std::str::FromStr;

use crate::error::ReaderError;

/// Which reader to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSelector {
    /// First available reader
    FirstAvailable,
    /// First reader whose name contains this pattern (case-insensitive)
    NameContains(String),
}

impl TransportSelector {
    /// Check whether a reader name satisfies this selector
    pub fn matches(&self, reader_name: &str) -> bool {
        match self {
            TransportSelector::FirstAvailable => true,
            TransportSelector::NameContains(pattern) => reader_name
                .to_lowercase()
                .contains(&pattern.to_lowercase()),
        }
    }

    /// Pick the first matching reader from a PC/SC reader list
    pub fn pick<'a, I>(&self, readers: I) -> Option<&'a CStr>
    where
        I: IntoIterator<Item = &'a CStr>,
    {
        readers
            .into_iter()
            .find(|reader| self.matches(&reader.to_string_lossy()))
    }
}

impl FromStr for TransportSelector {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transport, rest) = match s.split_once(':') {
            Some((transport, rest)) => (transport, Some(rest)),
            None => (s, None),
        };

        if !transport.eq_ignore_ascii_case("usb") {
            return Err(ReaderError::UnsupportedTransport(transport.to_string()));
        }

        match rest {
            None | Some("") => Ok(TransportSelector::FirstAvailable),
            Some(pattern) => Ok(TransportSelector::NameContains(pattern.to_string())),
        }
    }
}

impl fmt::Display for TransportSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSelector::FirstAvailable => write!(f, "usb"),
            TransportSelector::NameContains(pattern) => write!(f, "usb:{}", pattern),
        }
    }
}
