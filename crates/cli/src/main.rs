mod config;
mod render;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::thread;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use label_terminal_core::{
    Clock, PrintJob, Session, SessionError, SessionHandle, StatusEvent, SystemClock, Transport,
    channel, classify,
};
#[cfg(feature = "serial")]
use label_terminal_link::SerialConnector;
use label_terminal_link::StreamLink;
#[cfg(feature = "tcp")]
use label_terminal_link::TcpConnector;
use tracing_subscriber::EnvFilter;

use crate::config::{EndpointFlag, TerminalConfig, TransportKind, parse_endpoint_flag};
#[cfg(feature = "serial")]
use crate::render::render_ports;
use crate::render::{Format, render_job, render_token};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "labelterm",
    version,
    about = "Label terminal: scan a printer address, a part number, and a quantity to print labels"
)]
struct Cli {
    /// Output mode for `classify`, `encode`, and `ports`: "pretty" for plain
    /// text, "json" for machine-readable JSON. Defaults to "pretty" when
    /// stdout is a TTY, "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log more (repeat for more detail). Logs go to stderr; `RUST_LOG`
    /// overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run an interactive session: one token per line on stdin, status lines
    /// on stdout.
    Session {
        /// JSON config file (transport, timeouts, endpoint table).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Transport to the printer. Overrides the config file.
        #[arg(long, value_enum)]
        transport: Option<TransportKind>,
        /// Serial baud rate. Overrides the config file.
        #[arg(long)]
        baud: Option<u32>,
        /// Map a printer address to a device path or host:port
        /// (repeatable), e.g. `AABBCCDDEEFF=/dev/rfcomm0`.
        #[arg(long = "endpoint", value_name = "ADDRESS=TARGET", value_parser = parse_endpoint_flag)]
        endpoints: Vec<EndpointFlag>,
        /// Trace link traffic as hex/ASCII at TRACE level.
        #[arg(long)]
        trace_io: bool,
    },

    /// Classify one token as an address, a quantity, or a part number.
    Classify {
        /// The raw token. Omit for an empty token.
        #[arg(default_value = "", allow_hyphen_values = true)]
        token: String,
    },

    /// Encode a print job and print its command stream.
    Encode {
        /// Part number for the barcode and text lines.
        #[arg(long, default_value = "")]
        id: String,
        /// Label count.
        #[arg(long, default_value = "1")]
        qty: String,
        /// Job date as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List serial ports that could carry a printer link.
    #[cfg(feature = "serial")]
    Ports,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Session {
            config,
            transport,
            baud,
            endpoints,
            trace_io,
        } => {
            let mut terminal = TerminalConfig::load_or_default(config.as_deref())?;
            if let Some(kind) = transport {
                terminal.transport = kind;
            }
            if let Some(baud) = baud {
                terminal.link.baud = baud;
            }
            terminal.apply_endpoints(&endpoints);
            terminal.link.trace_io |= trace_io;
            cmd_session(terminal)?;
        }
        Cmd::Classify { token } => render_token(&classify(&token), format)?,
        Cmd::Encode { id, qty, date } => {
            let date = date.unwrap_or_else(|| SystemClock.today());
            render_job(&PrintJob::new(id, qty, date), format)?;
        }
        #[cfg(feature = "serial")]
        Cmd::Ports => render_ports(&SerialConnector::list_ports(), format)?,
    }

    Ok(())
}

/// Install the stderr log subscriber.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_session(terminal: TerminalConfig) -> Result<()> {
    let (handle, inbox) = channel();
    let transport = open_transport(&terminal, &handle)?;
    let mut session = Session::new(transport, inbox)
        .with_banner(env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));

    spawn_stdin_reader(handle)?;

    let outcome = session.run(|line: &StatusEvent| println!("{line}"));
    match outcome {
        Ok(()) => Ok(()),
        Err(SessionError::RadioUnavailable) => {
            // The status line already explained it.
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the configured transport, wired to the session's inbox.
fn open_transport(terminal: &TerminalConfig, handle: &SessionHandle) -> Result<Box<dyn Transport>> {
    let sink = handle.link_sink();
    let link = terminal.link.clone();
    tracing::debug!(transport = ?terminal.transport, endpoints = link.endpoints.len(), "opening transport");
    match terminal.transport {
        #[cfg(feature = "serial")]
        TransportKind::Serial => Ok(Box::new(StreamLink::new(SerialConnector::new(link), sink))),
        #[cfg(feature = "tcp")]
        TransportKind::Tcp => Ok(Box::new(StreamLink::new(TcpConnector::new(link), sink))),
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("transport '{other:?}' is not compiled into this build"),
    }
}

/// Forward stdin lines to the session, closing it at end of input.
fn spawn_stdin_reader(handle: SessionHandle) -> Result<()> {
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(token) => {
                        if !handle.submit(token) {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stopped reading stdin");
                        break;
                    }
                }
            }
            handle.close();
        })
        .context("failed to spawn stdin reader")?;
    Ok(())
}
