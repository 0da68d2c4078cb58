//! Severity-tagged log records and their text-line rendering.
//!
//! A rendered record looks like:
//!
//! ```text
//! [*] - [2024-01-02 03:04:05] => disk full
//! ```

use std::fmt;

use time::OffsetDateTime;

/// How serious a message is.
///
/// Severity is advisory only: every level is delivered the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational, can be ignored.
    Info,
    /// Worth noting.
    Warning,
    /// Should be investigated.
    Error,
    /// Should really be investigated. Does not stop the process.
    Fatal,
}

impl Severity {
    /// All severities, mildest first.
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// The single-character marker written between the leading brackets.
    pub fn marker(self) -> char {
        match self {
            Severity::Info => 'i',
            Severity::Warning => '@',
            Severity::Error => '*',
            Severity::Fatal => '!',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// One timestamped, severity-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    severity: Severity,
    timestamp: OffsetDateTime,
    message: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    ///
    /// Falls back to UTC when the local offset cannot be determined.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let timestamp =
            OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::with_timestamp(severity, timestamp, message)
    }

    /// Create a record with an explicit timestamp.
    pub fn with_timestamp(
        severity: Severity,
        timestamp: OffsetDateTime,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            timestamp,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// The unformatted message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render to the persisted line form (without a trailing newline).
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp;
        write!(
            f,
            "[{}] - [{:04}-{:02}-{:02} {:02}:{:02}:{:02}] => {}",
            self.severity.marker(),
            ts.year(),
            u8::from(ts.month()),
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            self.message
        )
    }
}
