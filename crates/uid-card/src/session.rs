//! Reader session: owns the device and drives the read loop

use std::io::Write;

use tracing::{debug, info, warn};
use uid_common::UidLine;

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::frontend::{Frontend, Tag};
use crate::reader::{Canceller, PcscFrontend};
use crate::selector::TransportSelector;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device handle held
    Idle,
    /// Device handle open, read loop may run
    ConnectedPolling,
}

/// Owns one frontend for the session lifetime and reports every tag seen
///
/// The frontend is released exactly once: by [`ReaderSession::close`], at the
/// end of [`ReaderSession::run_forever`], or on drop, whichever comes first.
pub struct ReaderSession<F: Frontend> {
    frontend: Option<F>,
}

impl ReaderSession<PcscFrontend> {
    /// Open the PC/SC reader named by `selector` (e.g. `usb`)
    pub fn open(selector: &str) -> Result<Self, ReaderError> {
        Self::open_with_config(selector, ReaderConfig::default())
    }

    /// Open the PC/SC reader named by `selector` with explicit options
    pub fn open_with_config(selector: &str, config: ReaderConfig) -> Result<Self, ReaderError> {
        let selector: TransportSelector = selector.parse()?;
        let frontend = PcscFrontend::open(&selector, config)?;
        Ok(Self::new(frontend))
    }

    /// Handle to interrupt [`ReaderSession::run_forever`] from another thread
    pub fn canceller(&self) -> Option<Canceller> {
        self.frontend.as_ref().and_then(PcscFrontend::canceller)
    }

    /// Name of the open reader
    pub fn reader_name(&self) -> Option<String> {
        self.frontend.as_ref().map(PcscFrontend::reader_name)
    }
}

impl<F: Frontend> ReaderSession<F> {
    /// Wrap an already opened frontend
    pub fn new(frontend: F) -> Self {
        Self {
            frontend: Some(frontend),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.frontend.is_some() {
            SessionState::ConnectedPolling
        } else {
            SessionState::Idle
        }
    }

    /// Report tags to `out` until interrupted or the device fails
    ///
    /// An interrupt ends the loop with `Ok(())`. Any other error is returned.
    /// The frontend is closed before this returns in both cases.
    pub fn run_forever<W: Write>(&mut self, out: &mut W) -> Result<(), ReaderError> {
        let result = self.poll(out);
        self.close();

        match result {
            Err(ReaderError::Interrupted) => {
                info!("Interrupted, reader session closed");
                Ok(())
            }
            other => other,
        }
    }

    fn poll<W: Write>(&mut self, out: &mut W) -> Result<(), ReaderError> {
        let frontend = self
            .frontend
            .as_mut()
            .ok_or_else(|| ReaderError::DeviceUnavailable("session is closed".to_string()))?;

        let mut handler = |tag: &dyn Tag| on_connect(tag, &mut *out);
        loop {
            frontend.connect(&mut handler)?;
        }
    }

    /// Release the frontend. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut frontend) = self.frontend.take() {
            frontend.close();
            debug!("Frontend closed");
        }
    }
}

impl<F: Frontend> Drop for ReaderSession<F> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Tag handler: print the tag's UID line and ask for an immediate disconnect
///
/// A failed identifier read prints `UID: UNKNOWN`. Always returns `true`.
pub fn on_connect<W: Write + ?Sized>(tag: &dyn Tag, out: &mut W) -> bool {
    let identifier = tag.identifier();
    if let Err(ref e) = identifier {
        debug!(error = %e, atr = %hex::encode_upper(tag.atr()), "Identifier read failed");
    }

    let line = UidLine::from_result(identifier);
    if let Err(e) = writeln!(out, "{}", line).and_then(|()| out.flush()) {
        warn!(error = %e, "Failed to write UID line");
    }

    true
}
