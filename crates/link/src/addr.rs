//! Endpoint resolution.
//!
//! The session only knows printers by link-layer address
//! (`AA:BB:CC:DD:EE:FF`). Each transport maps that address to something it can
//! open: a serial device node for SPP, a socket address for TCP.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::{LinkConfig, LinkError};

/// Default raw printing port (JetDirect / RAW).
pub const DEFAULT_PORT: u16 = 9100;

/// A resolved endpoint: what to open, and how to name the printer once open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Transport-specific target (device path or `host[:port]`).
    pub target: String,
    /// Name reported in `DeviceNamed` once the link is up.
    pub name: String,
}

/// Resolve `endpoint` through the endpoint table.
///
/// Table entries win. Without an entry, `fallback` decides whether the
/// endpoint can be used verbatim as a target; otherwise the endpoint is
/// unknown.
pub(crate) fn resolve_endpoint(
    config: &LinkConfig,
    endpoint: &str,
    fallback: impl Fn(&str) -> bool,
) -> Result<ResolvedEndpoint, LinkError> {
    if let Some(entry) = config.endpoint(endpoint) {
        return Ok(ResolvedEndpoint {
            target: entry.target.clone(),
            name: entry.name.clone().unwrap_or_else(|| endpoint.to_string()),
        });
    }

    if fallback(endpoint) {
        return Ok(ResolvedEndpoint {
            target: endpoint.to_string(),
            name: endpoint.to_string(),
        });
    }

    Err(LinkError::UnknownEndpoint(endpoint.to_string()))
}

/// Whether `endpoint` already looks like a serial device (`/dev/...`, `COM3`).
#[cfg_attr(not(feature = "serial"), allow(dead_code))]
pub(crate) fn is_device_path(endpoint: &str) -> bool {
    endpoint.starts_with('/')
        || endpoint
            .strip_prefix("COM")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Resolve a user-provided printer address string to a `SocketAddr`.
///
/// Accepts these formats:
/// - `192.168.1.55:9100` -- IP with explicit port
/// - `192.168.1.55` -- IP without port (defaults to 9100)
/// - `printer01.local:9100` -- hostname with port
/// - `printer01.local` -- hostname without port (defaults to 9100)
///
/// Returns the first resolved address.
pub fn resolve_socket_addr(input: &str) -> Result<SocketAddr, LinkError> {
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    if let Ok(mut addrs) = input.to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    if let Ok(mut addrs) = (input, DEFAULT_PORT).to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    Err(LinkError::NoAddressFound(input.to_string()))
}
