//! Configuration types for printer links.

use std::collections::BTreeMap;
use std::time::Duration;

/// Default baud rate for SPP serial printers (9600 8N1).
pub const DEFAULT_BAUD: u32 = 9600;

/// Complete link configuration: timeouts, open retry, serial settings and
/// the endpoint table.
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LinkConfig {
    /// Transport timeout settings.
    pub timeouts: LinkTimeouts,
    /// Retry settings used while opening a connection.
    pub retry: RetryConfig,
    /// Baud rate for serial transports.
    pub baud: u32,
    /// Known printers, keyed by link-layer address (`AA:BB:CC:DD:EE:FF`).
    pub endpoints: BTreeMap<String, EndpointEntry>,
    /// Emit hex/ASCII dumps of link traffic at TRACE level.
    pub trace_io: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            timeouts: LinkTimeouts::default(),
            retry: RetryConfig::default(),
            baud: DEFAULT_BAUD,
            endpoints: BTreeMap::new(),
            trace_io: false,
        }
    }
}

impl LinkConfig {
    /// Look up the endpoint table entry for `endpoint`.
    ///
    /// Keys compare case-insensitively, so `aa:bb:...` and `AA:BB:...` name
    /// the same printer.
    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointEntry> {
        self.endpoints
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(endpoint))
            .map(|(_, entry)| entry)
    }

    /// Add or replace an endpoint table entry.
    pub fn insert_endpoint(&mut self, endpoint: impl Into<String>, entry: EndpointEntry) {
        let endpoint = endpoint.into();
        self.endpoints
            .retain(|key, _| !key.eq_ignore_ascii_case(&endpoint));
        self.endpoints.insert(endpoint, entry);
    }
}

/// Where a link-layer address is reachable on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointEntry {
    /// Serial device path (e.g. `/dev/rfcomm0`, `COM5`) or `host[:port]` for TCP.
    pub target: String,
    /// Human-readable printer name reported once connected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl EndpointEntry {
    /// Create an entry without a display name.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Timeout settings for printer links.
///
/// - `connect`: 5s, TCP connect deadline
/// - `write`: 10s, per-command write deadline
/// - `read`: 500ms, also the interval at which the reader thread notices a
///   superseded or closed connection
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LinkTimeouts {
    /// Maximum time to wait for a connection to establish.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub connect: Duration,
    /// Maximum time to wait for a write to complete.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub write: Duration,
    /// Read poll interval for inbound data.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub read: Duration,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            write: Duration::from_secs(10),
            read: Duration::from_millis(500),
        }
    }
}

/// Retry settings for opening a connection.
///
/// Uses exponential backoff with optional jitter. Only errors where
/// `LinkError::is_retryable()` returns `true` are retried. The default is a
/// single attempt: a failed connect is reported once and the operator
/// decides whether to scan again.
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Initial delay between retries.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub max_delay: Duration,
    /// Whether to add random jitter to retry delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

/// Durations are written as integer milliseconds in config files.
#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
