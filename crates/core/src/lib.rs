//! Label terminal core.
//!
//! Turns operator tokens (printer address, part number, quantity) into
//! printed labels. The main entry points are [`classify`] for tokens,
//! [`encode`] for the printer command stream, and [`Session`] for the
//! stateful controller that ties them to a printer link.

#![warn(missing_docs)]

/// Input token classification.
pub mod classify;
/// Date source for print jobs.
pub mod clock;
/// Session error types.
pub mod error;
/// Print-job command encoding.
pub mod job;
/// Session controller and its inbox.
pub mod session;
/// Operator-facing status log.
pub mod status;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Classifier
pub use classify::{DEFAULT_QUANTITY, Token, classify};

// Encoder
pub use job::{JOB_COMMAND_COUNT, PrintJob, encode, format_job_date};

// Session
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::SessionError;
pub use session::{
    LinkSink, PendingJobFields, Session, SessionHandle, SessionInbox, SessionInput, SessionState,
    channel,
};
pub use status::{StatusEvent, StatusLog};

// Link contract, re-exported so callers need only one import path.
pub use label_terminal_link::{ConnectionState, EventSink, LinkEvent, Transport};
