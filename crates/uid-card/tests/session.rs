//! Read-loop behaviour against a scripted frontend
//!
//! These tests need no hardware: the frontend replays a fixed sequence of
//! presentations, device failures and interrupts.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use uid_card::{Frontend, IdentifierError, PcscError, ReaderError, ReaderSession, SessionState, Tag};

enum Step {
    /// A tag with a readable identifier
    Present(Vec<u8>),
    /// A tag whose identifier cannot be read
    Unreadable,
    /// The reader fails while waiting
    DeviceFailure(PcscError),
}

struct ScriptedTag(Option<Vec<u8>>);

impl Tag for ScriptedTag {
    fn identifier(&self) -> Result<Vec<u8>, IdentifierError> {
        self.0
            .clone()
            .ok_or_else(|| IdentifierError::Status("6A81".to_string()))
    }
}

/// Replays `steps`, then behaves as if the user pressed Ctrl+C
struct ScriptedFrontend {
    steps: VecDeque<Step>,
    handler_calls: Rc<Cell<u32>>,
    disconnects: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
}

#[derive(Clone, Default)]
struct Counters {
    handler_calls: Rc<Cell<u32>>,
    disconnects: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
}

impl ScriptedFrontend {
    fn new(steps: Vec<Step>, counters: &Counters) -> Self {
        Self {
            steps: steps.into(),
            handler_calls: Rc::clone(&counters.handler_calls),
            disconnects: Rc::clone(&counters.disconnects),
            closes: Rc::clone(&counters.closes),
        }
    }
}

impl Frontend for ScriptedFrontend {
    fn connect(&mut self, on_connect: &mut dyn FnMut(&dyn Tag) -> bool) -> Result<(), ReaderError> {
        let tag = match self.steps.pop_front() {
            Some(Step::Present(uid)) => ScriptedTag(Some(uid)),
            Some(Step::Unreadable) => ScriptedTag(None),
            Some(Step::DeviceFailure(e)) => return Err(e.into()),
            None => return Err(ReaderError::Interrupted),
        };

        self.handler_calls.set(self.handler_calls.get() + 1);
        if on_connect(&tag) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

fn run(steps: Vec<Step>) -> (Result<(), ReaderError>, String, Counters) {
    let counters = Counters::default();
    let mut session = ReaderSession::new(ScriptedFrontend::new(steps, &counters));
    assert_eq!(session.state(), SessionState::ConnectedPolling);

    let mut out = Vec::new();
    let result = session.run_forever(&mut out);
    assert_eq!(session.state(), SessionState::Idle);

    drop(session);
    (result, String::from_utf8(out).unwrap(), counters)
}

#[test]
fn test_reports_uid_in_uppercase_hex() {
    let (result, output, _) = run(vec![Step::Present(vec![0x04, 0xA1, 0x9C, 0x3B])]);
    assert!(result.is_ok());
    assert_eq!(output, "UID: 04A19C3B\n");
}

#[test]
fn test_unreadable_tag_prints_unknown_and_continues() {
    let (result, output, counters) = run(vec![
        Step::Unreadable,
        Step::Present(vec![0x08, 0x12, 0x34, 0x56]),
    ]);
    assert!(result.is_ok());
    assert_eq!(output, "UID: UNKNOWN\nUID: 08123456\n");
    assert_eq!(counters.handler_calls.get(), 2);
}

#[test]
fn test_each_presentation_handled_once() {
    let (_, output, counters) = run(vec![
        Step::Present(vec![0x01]),
        Step::Present(vec![0x02]),
        Step::Present(vec![0x01]),
    ]);
    assert_eq!(output.lines().count(), 3);
    assert_eq!(counters.handler_calls.get(), 3);
    // Every tag asked for an immediate disconnect
    assert_eq!(counters.disconnects.get(), 3);
}

#[test]
fn test_interrupt_while_waiting_is_clean() {
    let (result, output, counters) = run(Vec::new());
    assert!(result.is_ok());
    assert!(output.is_empty());
    assert_eq!(counters.closes.get(), 1);
}

#[test]
fn test_device_failure_propagates_after_cleanup() {
    let (result, output, counters) = run(vec![
        Step::Present(vec![0xAA, 0xBB]),
        Step::DeviceFailure(PcscError::ReaderUnavailable),
    ]);
    assert!(matches!(
        result,
        Err(ReaderError::Pcsc(PcscError::ReaderUnavailable))
    ));
    assert_eq!(output, "UID: AABB\n");
    assert_eq!(counters.closes.get(), 1);
}

#[test]
fn test_close_is_idempotent() {
    let counters = Counters::default();
    let mut session = ReaderSession::new(ScriptedFrontend::new(Vec::new(), &counters));

    session.close();
    session.close();
    drop(session);
    assert_eq!(counters.closes.get(), 1);
}

#[test]
fn test_drop_releases_unused_session() {
    let counters = Counters::default();
    let session = ReaderSession::new(ScriptedFrontend::new(Vec::new(), &counters));
    drop(session);
    assert_eq!(counters.closes.get(), 1);
}

#[test]
fn test_run_after_close_is_an_error() {
    let counters = Counters::default();
    let mut session = ReaderSession::new(ScriptedFrontend::new(Vec::new(), &counters));
    session.close();

    let mut out = Vec::new();
    let result = session.run_forever(&mut out);
    assert!(matches!(result, Err(ReaderError::DeviceUnavailable(_))));
    assert_eq!(counters.handler_calls.get(), 0);
    assert_eq!(counters.closes.get(), 1);
}

#[test]
fn test_unsupported_transport_rejected_before_open() {
    let result = ReaderSession::open("tty:S0");
    assert!(matches!(result, Err(ReaderError::UnsupportedTransport(_))));
}
