//! The session controller.
//!
//! A [`Session`] owns the connection mirror, the remembered printer address,
//! and the job fields collected so far. Tokens and link events both arrive
//! through one [`SessionInbox`] and are applied one at a time, in the order
//! they were queued, by whoever drives the session (normally [`Session::run`]).

use std::sync::mpsc;

use label_terminal_link::{ConnectionState, EventSink, LinkEvent, Transport};

use crate::classify::{Token, classify};
use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::job::PrintJob;
use crate::status::{StatusEvent, StatusLog};

/// Placeholder printed for job fields that were never set.
pub const MISSING_FIELD: &str = "(none)";

/// Prompt shown after the banner.
pub const SCAN_PROMPT: &str = "scan the printer address barcode";

// ── Inbox ───────────────────────────────────────────────────────────────

/// One unit of work for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// A raw operator token, untrimmed.
    Token(String),
    /// An event reported by the transport.
    Link(LinkEvent),
    /// Stop the run loop.
    Close,
}

/// Sending side of a session inbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionInput>,
}

impl SessionHandle {
    /// Queue a raw token. Returns `false` once the session is gone.
    pub fn submit(&self, token: impl Into<String>) -> bool {
        self.tx.send(SessionInput::Token(token.into())).is_ok()
    }

    /// Ask the run loop to stop after the inputs already queued.
    pub fn close(&self) {
        let _ = self.tx.send(SessionInput::Close);
    }

    /// An [`EventSink`] that feeds link events into this session's inbox.
    pub fn link_sink(&self) -> LinkSink {
        LinkSink(self.tx.clone())
    }
}

/// Forwards [`LinkEvent`]s into a session inbox.
#[derive(Debug, Clone)]
pub struct LinkSink(mpsc::Sender<SessionInput>);

impl EventSink for LinkSink {
    fn emit(&self, event: LinkEvent) {
        let _ = self.0.send(SessionInput::Link(event));
    }
}

/// Receiving side of a session inbox.
#[derive(Debug)]
pub struct SessionInbox {
    rx: mpsc::Receiver<SessionInput>,
}

/// Create a connected handle/inbox pair.
pub fn channel() -> (SessionHandle, SessionInbox) {
    let (tx, rx) = mpsc::channel();
    (SessionHandle { tx }, SessionInbox { rx })
}

// ── State ───────────────────────────────────────────────────────────────

/// Job fields collected since the last job was derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingJobFields {
    /// Last scanned part number.
    pub identifier: Option<String>,
    /// Last submitted quantity.
    pub quantity: Option<String>,
}

/// Everything a session knows about its printer and the job in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    /// Connection state as last reported by the transport.
    pub connection: ConnectionState,
    /// Printer address from the last address token. Never cleared.
    pub endpoint: Option<String>,
    /// Display name of the printer from the last `DeviceNamed` event.
    pub device_name: Option<String>,
    /// Fields for the next job.
    pub pending: PendingJobFields,
}

// ── Session ─────────────────────────────────────────────────────────────

/// Drives one printer through a transport.
pub struct Session<T: Transport> {
    transport: T,
    inbox: SessionInbox,
    clock: Box<dyn Clock>,
    banner: String,
    state: SessionState,
    status: StatusLog,
    closed: bool,
}

impl<T: Transport> Session<T> {
    /// Create a session over `transport`, reading from `inbox`.
    ///
    /// The transport's events must be routed into the same inbox, usually by
    /// building it with [`SessionHandle::link_sink`].
    pub fn new(transport: T, inbox: SessionInbox) -> Self {
        let state = SessionState {
            connection: transport.state(),
            ..SessionState::default()
        };
        Self {
            transport,
            inbox,
            clock: Box::new(SystemClock),
            banner: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            state,
            status: StatusLog::new(),
            closed: false,
        }
    }

    /// Use `clock` for job dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the banner shown by [`start`](Self::start).
    pub fn with_banner(mut self, name: &str, version: &str) -> Self {
        self.banner = format!("{name} {version}");
        self
    }

    /// The status log so far.
    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a `Close` input has been processed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Check the radio and print the banner.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::RadioUnavailable`] when the transport reports
    /// that its radio cannot be used. The session is torn down first.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.transport.is_available() {
            tracing::error!("wireless link is not available, ending session");
            self.status.push(SessionError::RadioUnavailable.to_string());
            self.teardown();
            return Err(SessionError::RadioUnavailable);
        }
        tracing::info!(banner = %self.banner, connection = %self.state.connection, "session started");
        self.status.push(self.banner.clone());
        self.status.push(SCAN_PROMPT);
        Ok(())
    }

    /// Handle one raw token after applying everything already queued.
    pub fn submit(&mut self, token: &str) {
        self.pump();
        self.handle_token(token);
    }

    /// Apply every queued input without blocking. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(input) = self.inbox.rx.try_recv() {
            self.apply(input);
            applied += 1;
        }
        applied
    }

    /// Run until the inbox is closed, reporting each new status line.
    ///
    /// Calls [`start`](Self::start) first and tears the session down on the
    /// way out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::RadioUnavailable`] if the session cannot start.
    pub fn run(&mut self, mut on_status: impl FnMut(&StatusEvent)) -> Result<(), SessionError> {
        let started = self.start();
        let mut cursor = self.flush(0, &mut on_status);
        started?;

        while !self.closed {
            let Ok(input) = self.inbox.rx.recv() else {
                break;
            };
            self.apply(input);
            cursor = self.flush(cursor, &mut on_status);
        }

        self.teardown();
        self.flush(cursor, &mut on_status);
        Ok(())
    }

    /// Disconnect the transport. The endpoint is kept.
    pub fn teardown(&mut self) {
        tracing::debug!("tearing down session");
        self.transport.disconnect();
        self.state.connection = ConnectionState::Disconnected;
    }

    fn flush(&self, cursor: usize, on_status: &mut impl FnMut(&StatusEvent)) -> usize {
        for line in self.status.since(cursor) {
            on_status(line);
        }
        self.status.len()
    }

    fn apply(&mut self, input: SessionInput) {
        match input {
            SessionInput::Token(token) => self.handle_token(&token),
            SessionInput::Link(event) => self.apply_link_event(event),
            SessionInput::Close => self.closed = true,
        }
    }

    // ── Tokens ──────────────────────────────────────────────────────────

    fn handle_token(&mut self, raw: &str) {
        let token = classify(raw);
        tracing::debug!(kind = token.kind(), value = token.value(), "classified token");
        match token {
            Token::Address(address) => self.on_address(address),
            Token::Quantity(quantity) => self.on_quantity(quantity),
            Token::Identifier(identifier) => {
                self.status.push(format!("part number: {identifier}"));
                self.state.pending.identifier = Some(identifier);
            }
        }
    }

    fn on_address(&mut self, address: String) {
        self.state.endpoint = Some(address.clone());
        self.status.push(format!("connecting to {address}"));
        self.connect(&address);
    }

    fn on_quantity(&mut self, quantity: String) {
        self.state.pending.quantity = Some(quantity.clone());
        let identifier = self.state.pending.identifier.clone().unwrap_or_default();
        let job = PrintJob::new(identifier, quantity, self.clock.today());

        let shown = |value: Option<&str>| value.unwrap_or(MISSING_FIELD).to_string();
        self.status.push("print started");
        self.status.push(format!(
            "{}: {}",
            shown(self.state.device_name.as_deref()),
            shown(self.state.endpoint.as_deref())
        ));
        self.status.push(format!(
            "part number: {}",
            shown(self.state.pending.identifier.as_deref())
        ));
        self.status.push(format!("date: {}", job.date));
        self.status.push(format!("quantity: {}", job.quantity));
        // Fields are never carried into another job, sent or not.
        self.state.pending = PendingJobFields::default();

        if self.state.connection != ConnectionState::Connected {
            match self.state.endpoint.clone() {
                Some(endpoint) => {
                    tracing::info!(%endpoint, connection = %self.state.connection, "not connected, reconnecting; job dropped");
                    self.status.push(format!("reconnecting to {endpoint}"));
                    self.connect(&endpoint);
                }
                None => {
                    tracing::warn!("not connected and no printer address known; job dropped");
                    self.status.push("disconnected, re-scan the printer address");
                }
            }
            return;
        }

        for command in job.commands() {
            self.transport.send(command.as_bytes());
        }
        tracing::info!(
            identifier = %job.identifier,
            quantity = %job.quantity,
            date = %job.date,
            "job sent"
        );
        self.status.push("job finished");
    }

    fn connect(&mut self, endpoint: &str) {
        self.state.connection = ConnectionState::Connecting;
        self.transport.connect(endpoint, false);
    }

    // ── Link events ─────────────────────────────────────────────────────

    /// Apply one transport event to the session.
    pub fn apply_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::StateChanged(next) => {
                tracing::debug!(from = %self.state.connection, to = %next, "link state changed");
                self.state.connection = next;
                match next {
                    ConnectionState::Connecting => self.status.push("connecting..."),
                    ConnectionState::Connected => {
                        let name = self.state.device_name.as_deref().unwrap_or(MISSING_FIELD);
                        self.status.push(format!("connected to {name}"));
                    }
                    ConnectionState::Disconnected => {}
                }
            }
            LinkEvent::DeviceNamed(name) => {
                self.status.push(format!("link ok: {name}"));
                self.state.device_name = Some(name);
            }
            LinkEvent::DataReceived(bytes) => {
                self.status.push(String::from_utf8_lossy(&bytes).into_owned());
            }
            LinkEvent::Toast(text) => self.status.push(text),
        }
    }
}
