//! Printer links: the byte-stream connection between a label terminal and
//! its printer.
//!
//! Supports serial/Bluetooth SPP and raw TCP transports. The contract is
//! event-driven: [`Transport::connect`] returns immediately and the outcome
//! arrives later as [`LinkEvent`]s on an [`EventSink`]. Nothing a transport
//! does surfaces as a synchronous error to its caller.
mod addr;
mod config;
mod error;
mod retry;
#[cfg(feature = "serial")]
mod serial;
mod stream;
#[cfg(feature = "tcp")]
mod tcp;

pub use addr::{DEFAULT_PORT, ResolvedEndpoint, resolve_socket_addr};
pub use config::{DEFAULT_BAUD, EndpointEntry, LinkConfig, LinkTimeouts, RetryConfig};
pub use error::LinkError;
#[cfg(feature = "serial")]
pub use serial::SerialConnector;
pub use stream::{Connector, OpenedLink, StreamLink};
#[cfg(feature = "tcp")]
pub use tcp::TcpConnector;

use std::fmt;
use std::sync::mpsc;

// ── Contract ────────────────────────────────────────────────────────────

/// Connection state of a printer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ConnectionState {
    /// No link, and no attempt in progress.
    #[default]
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// The link is up; writes reach the printer.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Something that happened on a link, reported asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link moved to a new state.
    StateChanged(ConnectionState),
    /// The connected printer's display name. Sent before `StateChanged(Connected)`.
    DeviceNamed(String),
    /// Bytes received from the printer.
    DataReceived(Vec<u8>),
    /// A short human-readable notice (failed connect, lost link).
    Toast(String),
}

/// Receiver side of the link event stream.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event. Must not block.
    fn emit(&self, event: LinkEvent);
}

impl EventSink for mpsc::Sender<LinkEvent> {
    fn emit(&self, event: LinkEvent) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// A connection to a printer, driven by a session.
///
/// All methods return immediately. Outcomes of `connect` and failures of
/// `send` are reported through the transport's [`EventSink`].
pub trait Transport: Send {
    /// Start connecting to `endpoint`, replacing any current connection.
    fn connect(&mut self, endpoint: &str, secure: bool);

    /// Write raw bytes. Dropped when the link is not connected.
    fn send(&mut self, data: &[u8]);

    /// Close the link. Emits `StateChanged(Disconnected)` if it was open.
    fn disconnect(&mut self);

    /// Current link state.
    fn state(&self) -> ConnectionState;

    /// Whether the underlying radio/port subsystem can be used at all.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, endpoint: &str, secure: bool) {
        (**self).connect(endpoint, secure);
    }

    fn send(&mut self, data: &[u8]) {
        (**self).send(data);
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
