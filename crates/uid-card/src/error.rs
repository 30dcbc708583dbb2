//! Error types for the reader session

use thiserror::Error;

/// Errors raised while opening or driving a reader
#[derive(Debug, Error)]
pub enum ReaderError {
    /// No matching reader, or the PC/SC service could not be reached
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The selector names a transport this reader does not speak
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// PC/SC error while waiting for or talking to a card
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// A blocking wait was cancelled by an interrupt
    #[error("Interrupted")]
    Interrupted,
}

/// The identifier of a presented tag could not be read
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// The card did not answer the GET DATA command
    #[error("transmit failed: {0}")]
    Transmit(#[from] pcsc::Error),

    /// The card answered with a non-success status word
    #[error("card returned status {0}")]
    Status(String),

    /// The card answered with an empty identifier
    #[error("empty identifier")]
    Empty,
}
