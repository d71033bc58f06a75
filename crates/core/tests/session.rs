//! Session controller tests: drives a `Session` over a scripted transport.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use label_terminal_core::{
    ConnectionState, EventSink, FixedClock, LinkEvent, LinkSink, PendingJobFields, Session,
    SessionError, SessionHandle, StatusEvent, Transport, channel,
};

// ── Mock transport ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Connect(String, bool),
    Send(Vec<u8>),
    Disconnect,
}

/// Records every call. When `device` is set, `connect` reports an immediate
/// successful connection to a printer of that name through the sink.
struct MockTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    state: ConnectionState,
    sink: LinkSink,
    device: Option<String>,
    available: bool,
}

impl Transport for MockTransport {
    fn connect(&mut self, endpoint: &str, secure: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Connect(endpoint.to_string(), secure));
        self.sink
            .emit(LinkEvent::StateChanged(ConnectionState::Connecting));
        self.state = ConnectionState::Connecting;
        if let Some(name) = &self.device {
            self.sink.emit(LinkEvent::DeviceNamed(name.clone()));
            self.sink
                .emit(LinkEvent::StateChanged(ConnectionState::Connected));
            self.state = ConnectionState::Connected;
        }
    }

    fn send(&mut self, data: &[u8]) {
        self.calls.lock().unwrap().push(Call::Send(data.to_vec()));
    }

    fn disconnect(&mut self) {
        self.calls.lock().unwrap().push(Call::Disconnect);
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Disconnected;
            self.sink
                .emit(LinkEvent::StateChanged(ConnectionState::Disconnected));
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

// ── Harness ─────────────────────────────────────────────────────────────

struct Harness {
    session: Session<MockTransport>,
    handle: SessionHandle,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Harness {
    fn new(initial: ConnectionState, device: Option<&str>) -> Self {
        Self::build(initial, device, true)
    }

    fn build(initial: ConnectionState, device: Option<&str>, available: bool) -> Self {
        let (handle, inbox) = channel();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport {
            calls: Arc::clone(&calls),
            state: initial,
            sink: handle.link_sink(),
            device: device.map(str::to_string),
            available,
        };
        let session = Session::new(transport, inbox)
            .with_clock(FixedClock(job_date()))
            .with_banner("labelterm", "0.1.0");
        Self {
            session,
            handle,
            calls,
        }
    }

    fn submit_all(&mut self, tokens: &[&str]) {
        for token in tokens {
            self.session.submit(token);
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn sends(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    fn connects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Connect(endpoint, _) => Some(endpoint),
                _ => None,
            })
            .collect()
    }

    fn lines(&self) -> Vec<String> {
        self.session
            .status()
            .lines()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn link_event(&self, event: LinkEvent) {
        self.handle.link_sink().emit(event);
    }
}

fn job_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

// ── Job completion ──────────────────────────────────────────────────────

#[test]
fn connected_session_prints_full_job() {
    let mut h = Harness::new(ConnectionState::Connected, Some("PR1"));
    h.submit_all(&["AABBCCDDEEFF", "PN123", "5"]);

    assert_eq!(h.connects(), ["AA:BB:CC:DD:EE:FF"]);
    let sends = h.sends();
    assert_eq!(sends.len(), 12);
    assert_eq!(sends[0], b"JOB\n");
    assert!(String::from_utf8_lossy(&sends[3]).contains("PN123"));
    assert!(String::from_utf8_lossy(&sends[5]).contains("PN123"));
    assert_eq!(sends[9], b"QTY P=5\n");
    assert_eq!(sends[11], b"JOBE\n");

    let lines = h.lines();
    assert_eq!(lines.last().map(String::as_str), Some("job finished"));
    assert!(lines.contains(&"PR1: AA:BB:CC:DD:EE:FF".to_string()));
    assert!(lines.contains(&"date: 2026.10.16".to_string()));
}

#[test]
fn status_lines_follow_token_sequence() {
    let mut h = Harness::new(ConnectionState::Disconnected, Some("PR1"));
    h.submit_all(&["AABBCCDDEEFF", "PN123", "5"]);

    assert_eq!(
        h.lines(),
        [
            "connecting to AA:BB:CC:DD:EE:FF",
            "connecting...",
            "link ok: PR1",
            "connected to PR1",
            "part number: PN123",
            "print started",
            "PR1: AA:BB:CC:DD:EE:FF",
            "part number: PN123",
            "date: 2026.10.16",
            "quantity: 5",
            "job finished",
        ]
    );
}

#[test]
fn connect_is_never_secure() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.submit_all(&["AABBCCDDEEFF", "5"]);
    assert!(
        h.calls()
            .iter()
            .all(|c| !matches!(c, Call::Connect(_, true)))
    );
}

#[test]
fn finished_job_clears_pending_fields() {
    let mut h = Harness::new(ConnectionState::Connected, None);
    h.submit_all(&["PN123", "5"]);
    assert_eq!(h.session.state().pending, PendingJobFields::default());

    // A second quantity prints again without a part number.
    h.session.submit("2");
    let sends = h.sends();
    assert_eq!(sends.len(), 24);
    assert_eq!(
        sends[15],
        b"BCD TP=7,X=0,Y=0,NW=1,RA=2,MG=1,HT=80\n\n".to_vec()
    );
    assert!(h.lines().contains(&"part number: (none)".to_string()));
}

#[test]
fn missing_fields_print_placeholders() {
    let mut h = Harness::new(ConnectionState::Connected, None);
    h.session.submit("");

    let lines = h.lines();
    assert!(lines.contains(&"(none): (none)".to_string()));
    assert!(lines.contains(&"part number: (none)".to_string()));
    assert!(lines.contains(&"quantity: 1".to_string()));
    assert_eq!(h.sends()[9], b"QTY P=1\n");
}

// ── Not connected at send time ──────────────────────────────────────────

#[test]
fn disconnected_without_endpoint_aborts_job() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.submit_all(&["PN123", "5"]);

    assert!(h.sends().is_empty());
    assert!(h.connects().is_empty());
    let lines = h.lines();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("disconnected, re-scan the printer address")
    );
    assert!(!lines.contains(&"job finished".to_string()));
    assert_eq!(h.session.state().pending, PendingJobFields::default());
}

#[test]
fn disconnected_with_endpoint_reconnects_once_and_sends_nothing() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.session.submit("AABBCCDDEEFF");
    h.link_event(LinkEvent::Toast("unable to connect device".into()));
    h.link_event(LinkEvent::StateChanged(ConnectionState::Disconnected));
    let before = h.connects().len();

    h.submit_all(&["PN123", "5"]);

    let connects = h.connects();
    assert_eq!(connects.len(), before + 1);
    assert_eq!(connects.last().map(String::as_str), Some("AA:BB:CC:DD:EE:FF"));
    assert!(h.sends().is_empty());
    let lines = h.lines();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("reconnecting to AA:BB:CC:DD:EE:FF")
    );
    assert!(lines.contains(&"unable to connect device".to_string()));
    assert!(!lines.contains(&"job finished".to_string()));
    assert_eq!(h.session.state().pending, PendingJobFields::default());
}

#[test]
fn reentered_job_prints_after_reconnect() {
    let mut h = Harness::new(ConnectionState::Disconnected, Some("PR1"));
    h.submit_all(&["AABBCCDDEEFF", "PN9"]);
    h.link_event(LinkEvent::Toast("device connection was lost".into()));
    h.link_event(LinkEvent::StateChanged(ConnectionState::Disconnected));

    h.session.submit("3");
    assert!(h.sends().is_empty());
    assert_eq!(h.connects().len(), 2);

    // The reconnect succeeded in the meantime, but the dropped job's fields
    // are gone and must be entered again.
    assert_eq!(h.session.state().pending, PendingJobFields::default());
    h.submit_all(&["PN9", "3"]);
    let sends = h.sends();
    assert_eq!(sends.len(), 12);
    assert_eq!(sends[3], b"BCD TP=7,X=0,Y=0,NW=1,RA=2,MG=1,HT=80\nPN9\n".to_vec());
    assert_eq!(sends[9], b"QTY P=3\n");
    assert_eq!(h.session.state().endpoint.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
}

#[test]
fn quantity_after_dropped_job_prints_without_part_number() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.submit_all(&["PN123", "5"]);
    h.link_event(LinkEvent::StateChanged(ConnectionState::Connected));

    h.session.submit("2");
    let sends = h.sends();
    assert_eq!(sends.len(), 12);
    assert_eq!(
        sends[3],
        b"BCD TP=7,X=0,Y=0,NW=1,RA=2,MG=1,HT=80\n\n".to_vec()
    );
    assert_eq!(sends[9], b"QTY P=2\n");
    assert_eq!(h.lines().last().map(String::as_str), Some("job finished"));
}

#[test]
fn address_is_remembered_before_connecting() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.session.submit("AABBCCDDEEFF");
    assert_eq!(h.session.state().endpoint.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    assert_eq!(h.connects(), ["AA:BB:CC:DD:EE:FF"]);
    assert_eq!(
        h.lines().last().map(String::as_str),
        Some("connecting to AA:BB:CC:DD:EE:FF")
    );
}

#[test]
fn lowercase_hex_is_a_part_number_not_an_address() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.session.submit("00a0c914c829");
    assert!(h.connects().is_empty());
    assert!(h.session.state().endpoint.is_none());
    assert_eq!(
        h.session.state().pending.identifier.as_deref(),
        Some("00a0c914c829")
    );
}

#[test]
fn connecting_state_is_not_connected() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.session.submit("AABBCCDDEEFF");
    h.session.pump();
    assert_eq!(h.session.state().connection, ConnectionState::Connecting);

    h.session.submit("5");
    assert!(h.sends().is_empty());
    assert_eq!(h.connects().len(), 2);
}

// ── Link events ─────────────────────────────────────────────────────────

#[test]
fn link_events_are_reported() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    h.link_event(LinkEvent::StateChanged(ConnectionState::Connecting));
    h.link_event(LinkEvent::DeviceNamed("PR1".into()));
    h.link_event(LinkEvent::StateChanged(ConnectionState::Connected));
    h.link_event(LinkEvent::DataReceived(b"PAPER OUT".to_vec()));
    h.link_event(LinkEvent::Toast("device connection was lost".into()));
    h.link_event(LinkEvent::StateChanged(ConnectionState::Disconnected));
    assert_eq!(h.session.pump(), 6);

    assert_eq!(
        h.lines(),
        [
            "connecting...",
            "link ok: PR1",
            "connected to PR1",
            "PAPER OUT",
            "device connection was lost",
        ]
    );
    assert_eq!(h.session.state().connection, ConnectionState::Disconnected);
    assert_eq!(h.session.state().device_name.as_deref(), Some("PR1"));
}

#[test]
fn inputs_apply_in_arrival_order() {
    let mut h = Harness::new(ConnectionState::Disconnected, None);
    // The quantity was queued before the link came up, so it sees no link.
    h.handle.submit("5");
    h.link_event(LinkEvent::StateChanged(ConnectionState::Connected));
    h.session.pump();

    assert!(h.sends().is_empty());
    assert_eq!(h.session.state().connection, ConnectionState::Connected);

    h.session.submit("5");
    assert_eq!(h.sends().len(), 12);
}

// ── Lifecycle ───────────────────────────────────────────────────────────

#[test]
fn unavailable_radio_ends_session() {
    let mut h = Harness::build(ConnectionState::Disconnected, None, false);
    let mut seen = Vec::new();
    h.handle.submit("AABBCCDDEEFF");

    let err = h
        .session
        .run(|line: &StatusEvent| seen.push(line.to_string()))
        .unwrap_err();

    assert!(matches!(err, SessionError::RadioUnavailable));
    assert_eq!(seen, ["wireless link is not available"]);
    assert_eq!(h.calls(), [Call::Disconnect]);
}

#[test]
fn run_reports_status_until_closed() {
    let mut h = Harness::new(ConnectionState::Connected, None);
    for token in ["PN123", "5"] {
        assert!(h.handle.submit(token));
    }
    h.handle.close();

    let mut seen = Vec::new();
    h.session
        .run(|line| seen.push(line.to_string()))
        .unwrap();

    assert_eq!(seen[0], "labelterm 0.1.0");
    assert_eq!(seen[1], "scan the printer address barcode");
    assert_eq!(seen[2], "part number: PN123");
    assert_eq!(seen.last().map(String::as_str), Some("job finished"));
    assert_eq!(seen.len(), h.session.status().len());
    assert!(h.session.is_closed());
    assert_eq!(h.calls().last(), Some(&Call::Disconnect));
    assert_eq!(h.sends().len(), 12);
}

fn wait_for(lines: &mpsc::Receiver<String>, wanted: &str) {
    loop {
        let line = lines
            .recv_timeout(Duration::from_secs(5))
            .unwrap_or_else(|_| panic!("never saw status line {wanted:?}"));
        if line == wanted {
            return;
        }
    }
}

#[test]
fn session_runs_on_its_own_thread() {
    let Harness {
        mut session,
        handle,
        calls,
    } = Harness::new(ConnectionState::Disconnected, Some("PR1"));
    let (lines_tx, lines_rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        session.run(|line| {
            let _ = lines_tx.send(line.to_string());
        })
    });

    handle.submit("AABBCCDDEEFF");
    wait_for(&lines_rx, "connected to PR1");
    handle.submit("PN123");
    handle.submit("5");
    handle.close();

    worker.join().unwrap().unwrap();
    let rest: Vec<String> = lines_rx.try_iter().collect();
    assert!(rest.contains(&"job finished".to_string()));
    let sent = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| matches!(c, Call::Send(_)))
        .count();
    assert_eq!(sent, 12);
}
