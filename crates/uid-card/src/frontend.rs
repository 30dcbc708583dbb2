//! Driver seam between the reader session and the contactless hardware

use crate::error::{IdentifierError, ReaderError};

/// A tag presented to the reader during one connect cycle
///
/// Only valid for the duration of the handler call that receives it.
pub trait Tag {
    /// Read the tag's hardware identifier (UID)
    fn identifier(&self) -> Result<Vec<u8>, IdentifierError>;

    /// Answer-to-reset reported by the reader, if any
    fn atr(&self) -> &[u8] {
        &[]
    }
}

/// A contactless frontend that can wait for tags
pub trait Frontend {
    /// Block until a tag is presented, then hand it to `on_connect`.
    ///
    /// When `on_connect` returns `true` the tag is treated as fully handled:
    /// the frontend disconnects and waits for it to leave the field before
    /// returning, so the same presentation is never reported twice.
    ///
    /// Returns [`ReaderError::Interrupted`] if the wait was cancelled.
    fn connect(&mut self, on_connect: &mut dyn FnMut(&dyn Tag) -> bool) -> Result<(), ReaderError>;

    /// Release the device. Called at most once by the session.
    fn close(&mut self);
}
