//! Serial/Bluetooth SPP connector using the `serialport` crate.
//!
//! Feature-gated behind the `serial` Cargo feature. A Bluetooth printer is
//! reached through the serial device its SPP channel is bound to (for
//! example `/dev/rfcomm0` after `rfcomm bind`, or an outgoing `COM` port on
//! Windows); the endpoint table maps the printer's address to that device.

use std::path::Path;

use crate::addr::{ResolvedEndpoint, is_device_path, resolve_endpoint};
use crate::{Connector, LinkConfig, LinkError, OpenedLink};

/// Opens serial ports for a [`StreamLink`](crate::StreamLink).
#[derive(Debug, Clone)]
pub struct SerialConnector {
    config: LinkConfig,
}

impl SerialConnector {
    /// Create a connector with the given configuration.
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Resolve `endpoint` to the device path that will be opened.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::UnknownEndpoint` when the endpoint has no table
    /// entry and is not itself a device path.
    pub fn resolve(&self, endpoint: &str) -> Result<ResolvedEndpoint, LinkError> {
        resolve_endpoint(&self.config, endpoint, is_device_path)
    }

    /// List available serial port names on the system.
    ///
    /// Returns port paths like `/dev/ttyUSB0`, `/dev/rfcomm0`, or `COM3`.
    ///
    /// **Note:** built with `serialport`'s default features disabled (no
    /// `libudev`). Enumeration on Linux falls back to sysfs and may return
    /// fewer details.
    pub fn list_ports() -> Vec<String> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.port_name)
            .collect()
    }
}

impl Connector for SerialConnector {
    fn open(&self, endpoint: &str, secure: bool) -> Result<OpenedLink, LinkError> {
        let resolved = self.resolve(endpoint)?;
        // SPP security is negotiated when the channel is bound, not per open.
        tracing::debug!(endpoint, target = %resolved.target, secure, "opening serial port");

        let port = serialport::new(&resolved.target, self.config.baud)
            .timeout(self.config.timeouts.read)
            .open()
            .map_err(|e| LinkError::SerialError(format!("{}: {e}", resolved.target)))?;
        let reader = port
            .try_clone()
            .map_err(|e| LinkError::SerialError(format!("{}: {e}", resolved.target)))?;

        Ok(OpenedLink {
            reader: Box::new(reader),
            writer: Box::new(port),
            device_name: resolved.name,
        })
    }

    fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// The radio is considered usable when any serial port enumerates or a
    /// configured device node exists.
    fn is_available(&self) -> bool {
        !Self::list_ports().is_empty()
            || self
                .config
                .endpoints
                .values()
                .any(|entry| Path::new(&entry.target).exists())
    }
}
