//! PC/SC card reader management

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pcsc::{Card, Context, Disposition, Protocols, ReaderState, Scope, State};
use tracing::{debug, info, warn};

use crate::apdu;
use crate::config::ReaderConfig;
use crate::error::{IdentifierError, ReaderError};
use crate::frontend::{Frontend, Tag};
use crate::selector::TransportSelector;

/// Establish a user-scope context and read the current reader list
fn establish() -> Result<(Context, Result<Vec<CString>, pcsc::Error>), ReaderError> {
    let context = Context::establish(Scope::User).map_err(|e| {
        ReaderError::DeviceUnavailable(format!("failed to establish PC/SC context: {}", e))
    })?;

    let mut readers_buf = [0; 2048];
    let readers: Result<Vec<CString>, pcsc::Error> = context
        .list_readers(&mut readers_buf)
        .map(|names| names.map(|name| name.to_owned()).collect());

    Ok((context, readers))
}

/// List all available card readers
pub fn list_readers() -> Result<Vec<String>, ReaderError> {
    let (_context, readers) = establish()?;

    match readers {
        Ok(readers) => Ok(readers
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect()),
        Err(pcsc::Error::NoReadersAvailable) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// What a reader state says about the card in the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardPresence {
    /// A card that answered reset is in the field
    Present,
    /// A card is in the field but does not respond
    Mute,
    /// The field is empty
    Absent,
    /// The reader itself disappeared
    Gone,
}

fn classify(state: State) -> CardPresence {
    if state.intersects(State::UNKNOWN | State::IGNORE) {
        CardPresence::Gone
    } else if !state.contains(State::PRESENT) {
        CardPresence::Absent
    } else if state.contains(State::MUTE) {
        CardPresence::Mute
    } else {
        CardPresence::Present
    }
}

/// Map one status-change call onto the wait loop: `None` means poll again
fn wait_outcome<T>(result: Result<T, pcsc::Error>) -> Result<Option<T>, ReaderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(pcsc::Error::Timeout) => Ok(None),
        Err(pcsc::Error::Cancelled) => Err(ReaderError::Interrupted),
        Err(e) => Err(e.into()),
    }
}

/// Poll until the reader reports `target`, returning the ATR seen then
///
/// `poll` performs one bounded status-change call and yields the new event
/// state and ATR.
fn wait_for<P>(
    target: CardPresence,
    reader: &str,
    interrupted: &AtomicBool,
    mut poll: P,
) -> Result<Vec<u8>, ReaderError>
where
    P: FnMut() -> Result<(State, Vec<u8>), pcsc::Error>,
{
    loop {
        if interrupted.load(Ordering::SeqCst) {
            return Err(ReaderError::Interrupted);
        }

        let Some((state, atr)) = wait_outcome(poll())? else {
            continue;
        };

        match classify(state) {
            CardPresence::Gone => {
                return Err(ReaderError::DeviceUnavailable(format!(
                    "reader '{}' went away",
                    reader
                )))
            }
            presence if presence == target => return Ok(atr),
            _ => {}
        }
    }
}

fn is_card_gone(error: &pcsc::Error) -> bool {
    matches!(
        error,
        pcsc::Error::NoSmartcard
            | pcsc::Error::RemovedCard
            | pcsc::Error::UnresponsiveCard
            | pcsc::Error::UnpoweredCard
    )
}

/// PC/SC reader opened for the lifetime of a session
pub struct PcscFrontend {
    context: Option<Context>,
    reader: CString,
    config: ReaderConfig,
    interrupted: Arc<AtomicBool>,
}

impl PcscFrontend {
    /// Establish a PC/SC context and claim the reader matching `selector`
    pub fn open(selector: &TransportSelector, config: ReaderConfig) -> Result<Self, ReaderError> {
        let (context, readers) = establish()?;
        let readers = readers.map_err(|e| match e {
            pcsc::Error::NoReadersAvailable => {
                ReaderError::DeviceUnavailable("no readers available".to_string())
            }
            e => ReaderError::DeviceUnavailable(format!("failed to list readers: {}", e)),
        })?;

        let reader = selector
            .pick(readers.iter().map(CString::as_c_str))
            .map(|name| name.to_owned())
            .ok_or_else(|| {
                ReaderError::DeviceUnavailable(format!("no reader matching '{}'", selector))
            })?;

        info!(reader = %reader.to_string_lossy(), "Reader opened");

        Ok(Self {
            context: Some(context),
            reader,
            config,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Name of the claimed reader
    pub fn reader_name(&self) -> String {
        self.reader.to_string_lossy().into_owned()
    }

    /// Handle that interrupts a blocked wait from another thread
    ///
    /// Returns `None` once the reader has been closed.
    pub fn canceller(&self) -> Option<Canceller> {
        self.context.as_ref().map(|context| Canceller {
            context: context.clone(),
            interrupted: Arc::clone(&self.interrupted),
        })
    }

    fn context(&self) -> Result<&Context, ReaderError> {
        self.context
            .as_ref()
            .ok_or_else(|| ReaderError::DeviceUnavailable("reader is closed".to_string()))
    }

    fn wait_until(&self, target: CardPresence) -> Result<Vec<u8>, ReaderError> {
        let context = self.context()?;
        let mut reader_states = vec![ReaderState::new(self.reader.clone(), State::UNAWARE)];

        wait_for(target, &self.reader_name(), &self.interrupted, || {
            reader_states[0].sync_current_state();
            context.get_status_change(self.config.poll_interval, &mut reader_states)?;
            Ok((reader_states[0].event_state(), reader_states[0].atr().to_vec()))
        })
    }
}

impl Frontend for PcscFrontend {
    fn connect(&mut self, on_connect: &mut dyn FnMut(&dyn Tag) -> bool) -> Result<(), ReaderError> {
        loop {
            let atr = self.wait_until(CardPresence::Present)?;

            let context = self.context()?;
            let card = match context.connect(&self.reader, self.config.share_mode.into(), Protocols::ANY) {
                Ok(card) => card,
                Err(e) if is_card_gone(&e) => {
                    debug!(error = %e, "Card left before connect");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            debug!(atr = %hex::encode_upper(&atr), "Tag connected");

            let release = {
                let tag = PcscTag { card: &card, atr };
                on_connect(&tag)
            };

            if let Err((_card, e)) = card.disconnect(Disposition::LeaveCard) {
                warn!(error = %e, "Card disconnect failed");
            }

            if release {
                self.wait_until(CardPresence::Absent)?;
                debug!("Tag removed");
            }

            return Ok(());
        }
    }

    fn close(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };

        match context.release() {
            Ok(()) => info!(reader = %self.reader_name(), "Reader released"),
            Err((_context, e)) => {
                // A canceller clone still holds the context; the last drop releases it
                debug!(error = %e, "Context still shared at close");
            }
        }
    }
}

/// Card connected through PC/SC for one connect cycle
pub struct PcscTag<'a> {
    card: &'a Card,
    atr: Vec<u8>,
}

impl Tag for PcscTag<'_> {
    fn identifier(&self) -> Result<Vec<u8>, IdentifierError> {
        apdu::get_uid(self.card)?.into_uid()
    }

    fn atr(&self) -> &[u8] {
        &self.atr
    }
}

/// Interrupts a [`PcscFrontend`] wait from another thread
#[derive(Clone)]
pub struct Canceller {
    context: Context,
    interrupted: Arc<AtomicBool>,
}

impl Canceller {
    /// Mark the session interrupted and wake any blocked wait
    pub fn cancel(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        if let Err(e) = self.context.cancel() {
            debug!(error = %e, "SCardCancel failed");
        }
    }
}
