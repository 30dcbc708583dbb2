//! PC/SC GET DATA pseudo-APDU for reading a contactless card's UID

use pcsc::{Card, MAX_BUFFER_SIZE};

use crate::error::IdentifierError;

/// GET DATA for the card UID (`FF CA 00 00 00`, PC/SC part 3)
///
/// Answered by the reader itself, so it works for any contactless card type
/// the reader can activate.
pub const GET_UID: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Reader answer to GET DATA: UID bytes followed by the status word
#[derive(Debug, Clone)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into data and status word
    ///
    /// Returns `None` if the response is too short to carry a status word.
    pub fn from_bytes(rapdu: &[u8]) -> Option<Self> {
        let (data, sw) = rapdu.split_at(rapdu.len().checked_sub(2)?);
        Some(Self {
            data: data.to_vec(),
            sw1: sw[0],
            sw2: sw[1],
        })
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Get status word as hex string (e.g., "6A81")
    pub fn status_string(&self) -> String {
        format!("{:02X}{:02X}", self.sw1, self.sw2)
    }

    /// The UID carried by this response
    ///
    /// A non-9000 status or an empty data field is not a UID.
    pub fn into_uid(self) -> Result<Vec<u8>, IdentifierError> {
        if !self.is_success() {
            return Err(IdentifierError::Status(self.status_string()));
        }
        if self.data.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(self.data)
    }
}

/// Send GET DATA to the connected card and return the reader's answer
pub fn get_uid(card: &Card) -> Result<ApduResponse, pcsc::Error> {
    let mut rapdu_buf = [0; MAX_BUFFER_SIZE];
    let rapdu = card.transmit(&GET_UID, &mut rapdu_buf)?;

    ApduResponse::from_bytes(rapdu).ok_or(pcsc::Error::InsufficientBuffer)
}
