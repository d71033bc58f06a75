//! Threaded stream transport shared by the serial and TCP links.
//!
//! Each `connect` bumps a generation counter and spawns a worker thread that
//! opens the stream (with retry) and then becomes the reader. Workers compare
//! their generation against the current one before touching shared state, so
//! a superseded attempt can finish late without disturbing the newer link.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::retry::retry_open;
use crate::{ConnectionState, EventSink, LinkConfig, LinkError, LinkEvent, Transport};

const CONNECT_FAILED: &str = "unable to connect device";
const CONNECTION_LOST: &str = "device connection was lost";

/// An opened byte stream to a printer.
pub struct OpenedLink {
    /// Inbound half. Reads should time out periodically (`WouldBlock` or
    /// `TimedOut`) so the reader can notice a closed link.
    pub reader: Box<dyn Read + Send>,
    /// Outbound half.
    pub writer: Box<dyn Write + Send>,
    /// Name reported to the session once connected.
    pub device_name: String,
}

/// Opens streams for a [`StreamLink`].
pub trait Connector: Send + Sync + 'static {
    /// Open a stream to `endpoint`. Blocking; runs on the link worker thread.
    fn open(&self, endpoint: &str, secure: bool) -> Result<OpenedLink, LinkError>;

    /// Configuration used for retries and traffic tracing.
    fn config(&self) -> &LinkConfig;

    /// Whether the underlying subsystem is usable at all.
    fn is_available(&self) -> bool {
        true
    }
}

struct Shared {
    state: ConnectionState,
    generation: u64,
    writer: Option<Box<dyn Write + Send>>,
}

/// A [`Transport`] over any [`Connector`], with a background reader thread.
pub struct StreamLink<C> {
    connector: Arc<C>,
    shared: Arc<Mutex<Shared>>,
    events: Arc<dyn EventSink>,
}

impl<C: Connector> StreamLink<C> {
    /// Create a disconnected link that reports to `events`.
    pub fn new(connector: C, events: impl EventSink) -> Self {
        Self {
            connector: Arc::new(connector),
            shared: Arc::new(Mutex::new(Shared {
                state: ConnectionState::Disconnected,
                generation: 0,
                writer: None,
            })),
            events: Arc::new(events),
        }
    }

    /// The connector this link opens streams with.
    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> Transport for StreamLink<C> {
    fn connect(&mut self, endpoint: &str, secure: bool) {
        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.writer = None;
            shared.state = ConnectionState::Connecting;
            self.events
                .emit(LinkEvent::StateChanged(ConnectionState::Connecting));
            shared.generation
        };
        tracing::info!(endpoint, generation, "connecting");

        let worker = Worker {
            connector: Arc::clone(&self.connector),
            shared: Arc::clone(&self.shared),
            events: Arc::clone(&self.events),
            generation,
        };
        let endpoint = endpoint.to_string();
        let spawned = thread::Builder::new()
            .name(format!("link-{generation}"))
            .spawn(move || worker.run(&endpoint, secure));
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn link worker");
            fail_connect(&self.shared, self.events.as_ref(), generation);
        }
    }

    fn send(&mut self, data: &[u8]) {
        let mut shared = lock(&self.shared);
        if shared.state != ConnectionState::Connected {
            tracing::debug!(bytes = data.len(), "not connected, dropping write");
            return;
        }
        let Some(writer) = shared.writer.as_mut() else {
            return;
        };
        if self.connector.config().trace_io {
            trace_bytes("tx", data);
        }
        let result = writer.write_all(data).and_then(|()| writer.flush());
        if let Err(e) = result {
            tracing::warn!(error = %LinkError::WriteFailed(e), "write failed");
            let generation = shared.generation;
            drop_link(&mut shared, self.events.as_ref(), generation);
        }
    }

    fn disconnect(&mut self) {
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.writer = None;
        let previous = std::mem::replace(&mut shared.state, ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            tracing::info!("disconnected");
            self.events
                .emit(LinkEvent::StateChanged(ConnectionState::Disconnected));
        }
    }

    fn state(&self) -> ConnectionState {
        lock(&self.shared).state
    }

    fn is_available(&self) -> bool {
        self.connector.is_available()
    }
}

impl<C> Drop for StreamLink<C> {
    fn drop(&mut self) {
        // Stop the reader without reporting: nobody owns the session any more.
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.writer = None;
        shared.state = ConnectionState::Disconnected;
    }
}

// ── Worker ──────────────────────────────────────────────────────────────

struct Worker<C> {
    connector: Arc<C>,
    shared: Arc<Mutex<Shared>>,
    events: Arc<dyn EventSink>,
    generation: u64,
}

impl<C: Connector> Worker<C> {
    fn run(self, endpoint: &str, secure: bool) {
        let retry = &self.connector.config().retry;
        let opened = retry_open(retry, |_| self.connector.open(endpoint, secure));

        let link = match opened {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "connect failed");
                fail_connect(&self.shared, self.events.as_ref(), self.generation);
                return;
            }
        };

        {
            let mut shared = lock(&self.shared);
            if shared.generation != self.generation {
                tracing::debug!(endpoint, "connect superseded, discarding stream");
                return;
            }
            shared.writer = Some(link.writer);
            shared.state = ConnectionState::Connected;
            self.events
                .emit(LinkEvent::DeviceNamed(link.device_name.clone()));
            self.events
                .emit(LinkEvent::StateChanged(ConnectionState::Connected));
        }
        tracing::info!(endpoint, device = %link.device_name, "connected");

        self.read_loop(link.reader);
    }

    fn read_loop(&self, mut reader: Box<dyn Read + Send>) {
        let trace_io = self.connector.config().trace_io;
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    tracing::debug!("stream closed by printer");
                    break;
                }
                Ok(n) => {
                    if !self.is_current() {
                        return;
                    }
                    if trace_io {
                        trace_bytes("rx", &buf[..n]);
                    }
                    self.events.emit(LinkEvent::DataReceived(buf[..n].to_vec()));
                }
                Err(e) if is_poll_timeout(&e) => {
                    if !self.is_current() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %LinkError::ReadFailed(e), "read failed");
                    break;
                }
            }
        }

        let mut shared = lock(&self.shared);
        drop_link(&mut shared, self.events.as_ref(), self.generation);
    }

    fn is_current(&self) -> bool {
        lock(&self.shared).generation == self.generation
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_poll_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

/// Report a failed connect attempt, unless a newer attempt replaced it.
fn fail_connect(shared: &Mutex<Shared>, events: &dyn EventSink, generation: u64) {
    let mut shared = lock(shared);
    if shared.generation != generation {
        return;
    }
    shared.state = ConnectionState::Disconnected;
    shared.writer = None;
    events.emit(LinkEvent::Toast(CONNECT_FAILED.to_string()));
    events.emit(LinkEvent::StateChanged(ConnectionState::Disconnected));
}

/// Tear down an established link that broke underneath us.
fn drop_link(shared: &mut Shared, events: &dyn EventSink, generation: u64) {
    if shared.generation != generation || shared.state != ConnectionState::Connected {
        return;
    }
    tracing::warn!("connection lost");
    shared.generation += 1;
    shared.writer = None;
    shared.state = ConnectionState::Disconnected;
    events.emit(LinkEvent::Toast(CONNECTION_LOST.to_string()));
    events.emit(LinkEvent::StateChanged(ConnectionState::Disconnected));
}

/// Dump link traffic as hex and printable ASCII.
fn trace_bytes(direction: &str, data: &[u8]) {
    let hex: Vec<String> = data.iter().map(|b| format!("{b:02x}")).collect();
    let ascii: String = data
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect();
    tracing::trace!(direction, len = data.len(), hex = %hex.join(" "), ascii = %ascii);
}
