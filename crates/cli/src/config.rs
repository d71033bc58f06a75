//! Terminal configuration: a JSON file overlaid with command-line flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use label_terminal_core::{Token, classify};
use label_terminal_link::{EndpointEntry, LinkConfig};
use serde::{Deserialize, Serialize};

/// Which transport carries the printer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TransportKind {
    /// Serial port or Bluetooth SPP device node.
    Serial,
    /// Raw TCP socket (port 9100).
    Tcp,
}

impl Default for TransportKind {
    fn default() -> Self {
        if cfg!(feature = "serial") {
            TransportKind::Serial
        } else {
            TransportKind::Tcp
        }
    }
}

/// Contents of a `--config` file.
///
/// ```json
/// {
///   "transport": "serial",
///   "link": {
///     "baud": 115200,
///     "endpoints": { "AA:BB:CC:DD:EE:FF": { "target": "/dev/rfcomm0", "name": "PR1" } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TerminalConfig {
    pub(crate) transport: TransportKind,
    pub(crate) link: LinkConfig,
}

impl TerminalConfig {
    /// Read a config file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))
    }

    /// Load `path` if given, otherwise start from defaults.
    pub(crate) fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Add or replace endpoint entries from `--endpoint` flags.
    pub(crate) fn apply_endpoints(&mut self, endpoints: &[EndpointFlag]) {
        for flag in endpoints {
            self.link
                .insert_endpoint(flag.address.clone(), EndpointEntry::new(flag.target.clone()));
        }
    }
}

/// A parsed `--endpoint ADDRESS=TARGET` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EndpointFlag {
    pub(crate) address: String,
    pub(crate) target: String,
}

/// Parse `ADDRESS=TARGET`. A bare 12-digit hex address of either case is put
/// in uppercase colon form so it matches what the classifier produces for
/// scanned addresses.
pub(crate) fn parse_endpoint_flag(value: &str) -> Result<EndpointFlag, String> {
    let (address, target) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=TARGET, got '{value}'"))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(format!("missing target in '{value}'"));
    }
    let address = match classify(&address.to_ascii_uppercase()) {
        Token::Address(normalized) => normalized,
        Token::Identifier(raw) => raw,
        Token::Quantity(_) => return Err(format!("'{address}' is not a printer address")),
    };
    Ok(EndpointFlag {
        address,
        target: target.to_string(),
    })
}
