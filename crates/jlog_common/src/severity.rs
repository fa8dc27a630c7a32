//! Ordered severity table
//!
//! `DEBUG < INFO < WARN < ERROR < CRIT`. The names are the exact strings
//! written to the `level` field of every log line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered by increasing urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Crit,
}

impl Severity {
    /// All severities in rank order
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Crit,
    ];

    /// Threshold used when the configured level is absent or unknown
    pub const DEFAULT_THRESHOLD: Severity = Severity::Warn;

    /// Position in the total order, 0 for DEBUG
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Wire name (`"DEBUG"`, `"INFO"`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Crit => "CRIT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name is not one of the five known names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Names are matched case-sensitively, `"warn"` is not a level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}
