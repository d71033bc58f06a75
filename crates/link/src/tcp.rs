//! TCP connector for printers on the raw port (9100 / JetDirect / RAW).
//!
//! Useful for network label printers and for SPP-to-TCP bridges. The endpoint
//! table maps the printer's link-layer address to `host[:port]`; endpoints
//! without an entry are parsed as socket addresses directly.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};

use crate::addr::{ResolvedEndpoint, resolve_endpoint, resolve_socket_addr};
use crate::{Connector, LinkConfig, LinkError, OpenedLink};

/// Opens TCP streams for a [`StreamLink`](crate::StreamLink).
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: LinkConfig,
}

impl TcpConnector {
    /// Create a connector with the given configuration.
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Resolve `endpoint` to the `host[:port]` target that will be dialled.
    pub fn resolve(&self, endpoint: &str) -> Result<ResolvedEndpoint, LinkError> {
        resolve_endpoint(&self.config, endpoint, |_| true)
    }

    /// Open a TCP connection and configure the stream (nodelay, keepalive, timeouts).
    fn open_stream(&self, addr: &SocketAddr) -> Result<TcpStream, LinkError> {
        let timeouts = &self.config.timeouts;
        let stream = TcpStream::connect_timeout(addr, timeouts.connect).map_err(|e| {
            match e.kind() {
                io::ErrorKind::ConnectionRefused => LinkError::ConnectionRefused {
                    addr: addr.to_string(),
                    source: e,
                },
                io::ErrorKind::TimedOut => LinkError::ConnectionTimeout {
                    addr: addr.to_string(),
                    timeout: timeouts.connect,
                    source: e,
                },
                _ => LinkError::ConnectionFailed {
                    addr: addr.to_string(),
                    source: e,
                },
            }
        })?;

        configure_stream(&stream, &self.config).map_err(|e| LinkError::ConnectionFailed {
            addr: addr.to_string(),
            source: e,
        })?;
        Ok(stream)
    }
}

impl Connector for TcpConnector {
    fn open(&self, endpoint: &str, _secure: bool) -> Result<OpenedLink, LinkError> {
        let resolved = self.resolve(endpoint)?;
        let addr = resolve_socket_addr(&resolved.target)?;
        tracing::debug!(endpoint, %addr, "opening tcp stream");

        let stream = self.open_stream(&addr)?;
        let reader = stream.try_clone().map_err(|e| LinkError::ConnectionFailed {
            addr: addr.to_string(),
            source: e,
        })?;

        // Without a configured name, report the peer the way it was dialled.
        let device_name = match self.config.endpoint(endpoint) {
            Some(entry) if entry.name.is_some() => resolved.name,
            _ => addr.to_string(),
        };

        Ok(OpenedLink {
            reader: Box::new(reader),
            writer: Box::new(stream),
            device_name,
        })
    }

    fn config(&self) -> &LinkConfig {
        &self.config
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Configure TCP_NODELAY, keepalive, and read/write timeouts on a stream.
fn configure_stream(stream: &TcpStream, config: &LinkConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;
    configure_keepalive(stream, Duration::from_secs(60))?;
    stream.set_write_timeout(Some(config.timeouts.write))?;
    // The read timeout doubles as the reader's poll interval.
    stream.set_read_timeout(Some(config.timeouts.read))?;
    Ok(())
}

/// Configure TCP keepalive on a `TcpStream` via `socket2`.
fn configure_keepalive(stream: &TcpStream, interval: Duration) -> io::Result<()> {
    let keepalive = TcpKeepalive::new().with_time(interval);

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_interval(interval);

    SockRef::from(stream).set_tcp_keepalive(&keepalive)?;
    Ok(())
}
