//! Core of the log classification engine.
//! Detects the format of a log stream, turns every line into a normalized record
//! and answers read-only queries over the resulting record set.
pub mod config;
pub mod detector;
pub mod error;
pub mod normalizer;
pub mod parser;
pub mod query;
pub mod session;
pub mod store;
pub mod tokenizer;

pub use config::{load_config, EngineConfig};
pub use detector::{Detection, FormatDetector};
pub use error::{PartialParse, SiftError};
pub use parser::LogFormat;
pub use query::{ErrorReport, KeywordMode, QueryEngine, Summary};
pub use session::{LogEngine, ParseSession};
pub use store::RecordStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// SEVERITY //

/// Canonical severity scale every format is normalized into.
///
/// `Unknown` sorts last and has no rank, so it never satisfies a threshold query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Unknown,
    ];

    /// Parse a severity word shared by several formats (case-insensitive)
    pub fn from_word(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "verbose" => Some(Self::Debug),
            "info" | "information" | "informational" | "notice" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warning),
            "err" | "error" => Some(Self::Error),
            "crit" | "critical" | "fatal" | "alert" | "emerg" | "emergency" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Position on the ordered scale, `None` for `Unknown`
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Debug => Some(0),
            Self::Info => Some(1),
            Self::Warning => Some(2),
            Self::Error => Some(3),
            Self::Critical => Some(4),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// RAW LINE //

/// One physical input line, terminator stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize, // 1-based
    pub text: String,
}

impl RawLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self { number, text: text.into() }
    }
}

// LOG RECORD //

/// Normalized record, one per input line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub line_number: usize,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    pub severity: Severity,

    #[serde(default)]
    pub source: Option<String>,

    pub message: String,

    pub raw: String, // original line, never modified

    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>, // grammar specific extras (pid, status, ...)
}

impl LogRecord {
    /// Record for a line no grammar could make sense of.
    pub fn unparsed(line: RawLine) -> Self {
        Self {
            line_number: line.number,
            timestamp: None,
            severity: Severity::Unknown,
            source: None,
            message: line.text.clone(),
            raw: line.text,
            fields: HashMap::new(),
        }
    }

    pub fn is_unparsed(&self) -> bool {
        self.severity == Severity::Unknown && self.timestamp.is_none() && self.message == self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_words() {
        assert_eq!(Severity::from_word("WARN"), Some(Severity::Warning));
        assert_eq!(Severity::from_word("err"), Some(Severity::Error));
        assert_eq!(Severity::from_word("emerg"), Some(Severity::Critical));
        assert_eq!(Severity::from_word("Information"), Some(Severity::Info));
        assert_eq!(Severity::from_word("banana"), None);
    }

    #[test]
    fn test_unknown_has_no_rank() {
        assert!(Severity::Unknown.rank().is_none());
        assert!(Severity::Critical.rank() > Severity::Error.rank());
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
    }

    #[test]
    fn test_unparsed_keeps_raw() {
        let record = LogRecord::unparsed(RawLine::new(7, "###garbage###"));
        assert_eq!(record.line_number, 7);
        assert_eq!(record.message, record.raw);
        assert!(record.is_unparsed());
    }
}
