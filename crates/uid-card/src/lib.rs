//! UID Card - Wait for contactless cards and read their UID
//!
//! This crate opens a PC/SC reader, blocks until a card is presented, reads
//! the card's hardware identifier with the reader's GET DATA pseudo-APDU and
//! reports it as one `UID: <HEX>` line per presentation.

pub mod apdu;
pub mod config;
pub mod error;
pub mod frontend;
pub mod reader;
pub mod selector;
pub mod session;

pub use config::{ReaderConfig, ShareMode};
pub use error::{IdentifierError, ReaderError};
pub use frontend::{Frontend, Tag};
pub use reader::{list_readers, Canceller, PcscFrontend, PcscTag};
pub use selector::TransportSelector;
pub use session::{on_connect, ReaderSession, SessionState};

/// Re-export commonly used types
pub use pcsc::Error as PcscError;
pub use uid_common::{normalize_uid, UidLine, UNKNOWN};
