//! The append-only status log shown to the operator.

use std::fmt;

/// One line of human-readable status.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct StatusEvent(pub String);

impl StatusEvent {
    /// The line's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StatusEvent {
    fn from(line: String) -> Self {
        Self(line)
    }
}

impl From<&str> for StatusEvent {
    fn from(line: &str) -> Self {
        Self(line.to_string())
    }
}

/// Ordered status lines, latest last. Never deduplicated or rewritten.
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    lines: Vec<StatusEvent>,
}

impl StatusLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line.
    pub fn push(&mut self, line: impl Into<StatusEvent>) {
        self.lines.push(line.into());
    }

    /// All lines in order.
    pub fn lines(&self) -> &[StatusEvent] {
        &self.lines
    }

    /// Lines appended at or after position `cursor`.
    ///
    /// Callers keep `len()` as a cursor to render only what is new.
    pub fn since(&self, cursor: usize) -> &[StatusEvent] {
        self.lines.get(cursor..).unwrap_or(&[])
    }

    /// The most recent line.
    pub fn last(&self) -> Option<&StatusEvent> {
        self.lines.last()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line equals `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.lines.iter().any(|l| l.as_str() == text)
    }
}
