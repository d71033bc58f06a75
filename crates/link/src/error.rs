//! Typed error types for printer links.

use std::io;
use std::time::Duration;

/// Link error conditions, categorized by type.
///
/// These never cross the [`Transport`](crate::Transport) boundary: connectors
/// return them to the link worker, which reports the outcome to the session
/// as [`LinkEvent`](crate::LinkEvent)s. Use [`LinkError::is_retryable()`] to
/// classify transient vs permanent failures.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    // -- Connection --
    /// The printer actively refused the connection.
    #[error("connection refused: {addr}")]
    ConnectionRefused {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The connect attempt timed out before the printer answered.
    #[error("connection timed out: {addr} ({timeout:?})")]
    ConnectionTimeout {
        /// The address that was attempted.
        addr: String,
        /// The configured timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Connection failed for a reason other than refusal or timeout.
    #[error("connection failed: {addr}")]
    ConnectionFailed {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The printer closed the connection.
    #[error("connection closed by printer")]
    ConnectionClosed,

    // -- Address --
    /// DNS resolution found no addresses for the given hostname.
    #[error("no address found for hostname: {0}")]
    NoAddressFound(String),

    /// The endpoint has no entry in the endpoint table and is not a device path.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    // -- I/O --
    /// Writing data to the printer failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// Reading data from the printer failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),

    // -- Serial-specific --
    /// A serial port transport error occurred.
    #[error("serial port error: {0}")]
    SerialError(String),

    // -- Configuration --
    /// An invalid configuration was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Retry --
    /// All open attempts have been exhausted.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Total number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last_error: Box<LinkError>,
    },
}

impl LinkError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LinkError::ConnectionTimeout { .. }
                | LinkError::ConnectionClosed
                | LinkError::WriteFailed(_)
                | LinkError::ReadFailed(_)
                | LinkError::SerialError(_)
        )
    }
}
