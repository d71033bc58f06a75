//! Print-job encoding.
//!
//! A job is twelve command entries sent to the printer as a raw line stream.
//! The firmware reads the stream in order, so the entry order is fixed.

use chrono::NaiveDate;

// ── Protocol constants ──────────────────────────────────────────────────

/// Opens a job.
pub const CMD_JOB: &str = "JOB";
/// Static label geometry and media configuration.
pub const CMD_DEFINE: &str =
    "DEF MK=1,MD=1,DR=2,DK=12,MS=39,PO=45,TO=110,PH=344,PW=384,UM=12,BM=12,XO=0,AF=1";
/// Starts the label body.
pub const CMD_START: &str = "START";
/// Barcode draw; the next line is the barcode data.
pub const CMD_BARCODE: &str = "BCD TP=7,X=0,Y=0,NW=1,RA=2,MG=1,HT=80";
/// Large font for the human-readable part number.
pub const CMD_FONT_LARGE: &str = "FONT TP=7,CS=0,LG=60,WD=48,LS=0";
/// Text draw for the part number line.
pub const CMD_TEXT_IDENTIFIER: &str = "TEXT X=0,Y=120,L=1";
/// Small font for the date and running count.
pub const CMD_FONT_SMALL: &str = "FONT TP=27,CS=0,LG=32,WD=32,LS=0";
/// Text draw for the date line.
pub const CMD_TEXT_DATE: &str = "TEXT X=0,Y=260,L=1";
/// Text draw with firmware auto-increment of a three-digit counter.
pub const CMD_TEXT_COUNTER: &str = "TEXT X=250,Y=260,L=1,NS=1,NE=3,NK=1,NI=1,NZ=1,NB=0";
/// Ends the label body.
pub const CMD_END: &str = "END";
/// Closes the job.
pub const CMD_JOB_END: &str = "JOBE";

/// Number of entries in an encoded job.
pub const JOB_COMMAND_COUNT: usize = 12;

/// Date layout printed on labels: year, month, day without padding.
const DATE_FORMAT: &str = "%Y.%-m.%-d";

/// Render a date the way labels print it (`2026.1.5`).
pub fn format_job_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Encode a job into its ordered command entries.
///
/// Each entry ends with a newline. Entries that carry data (barcode,
/// identifier text, date, running count) hold the command line and the data
/// line together. Values are interpolated verbatim.
pub fn encode(identifier: &str, quantity: &str, date: &str) -> Vec<String> {
    vec![
        format!("{CMD_JOB}\n"),
        format!("{CMD_DEFINE}\n"),
        format!("{CMD_START}\n"),
        format!("{CMD_BARCODE}\n{identifier}\n"),
        format!("{CMD_FONT_LARGE}\n"),
        format!("{CMD_TEXT_IDENTIFIER}\n{identifier}\n"),
        format!("{CMD_FONT_SMALL}\n"),
        format!("{CMD_TEXT_DATE}\n{date}\n"),
        format!("{CMD_TEXT_COUNTER}\n001/{quantity}\n"),
        format!("QTY P={quantity}\n"),
        format!("{CMD_END}\n"),
        format!("{CMD_JOB_END}\n"),
    ]
}

/// A job captured at the moment a quantity completes it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrintJob {
    /// Part number; empty when none was scanned.
    pub identifier: String,
    /// Label count, verbatim from the quantity token.
    pub quantity: String,
    /// Date line, already formatted.
    pub date: String,
}

impl PrintJob {
    /// Capture a job, formatting `date` with [`format_job_date`].
    pub fn new(identifier: impl Into<String>, quantity: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            identifier: identifier.into(),
            quantity: quantity.into(),
            date: format_job_date(date),
        }
    }

    /// The ordered command entries for this job.
    pub fn commands(&self) -> Vec<String> {
        encode(&self.identifier, &self.quantity, &self.date)
    }

    /// The full wire stream: all entries concatenated.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.commands().concat().into_bytes()
    }
}
