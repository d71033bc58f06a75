//! Output rendering for the non-interactive subcommands.
//!
//! Pretty output is plain text for people; JSON output is a single document
//! per invocation for scripts.

use std::io::{self, IsTerminal};

use anyhow::Result;
use label_terminal_core::{PrintJob, Token};
use serde::Serialize;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable text.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Renderers ───────────────────────────────────────────────────────────

/// Print one classified token.
pub(crate) fn render_token(token: &Token, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(token),
        Format::Pretty => {
            println!("{token}");
            Ok(())
        }
    }
}

/// Print an encoded job: the raw stream, or its entries as JSON.
pub(crate) fn render_job(job: &PrintJob, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&serde_json::json!({
            "job": job,
            "commands": job.commands(),
        })),
        Format::Pretty => {
            print!("{}", job.commands().concat());
            Ok(())
        }
    }
}

/// Print serial port names, one per line or as a JSON array.
#[cfg(feature = "serial")]
pub(crate) fn render_ports(ports: &[String], format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&serde_json::json!({ "ports": ports })),
        Format::Pretty => {
            if ports.is_empty() {
                eprintln!("no serial ports found");
            }
            for port in ports {
                println!("{port}");
            }
            Ok(())
        }
    }
}
