//! Grammar set - one line-shape pattern and severity table per known log format

pub mod apache;
pub mod nginx;
pub mod syslog;
pub mod windows;

pub use apache::ApacheGrammar;
pub use nginx::NginxGrammar;
pub use syslog::SyslogGrammar;
pub use windows::WindowsEventGrammar;

use crate::config::TimestampConfig;
use crate::Severity;
use chrono::{DateTime, Utc};
use regex::Captures;
use serde::{Deserialize, Serialize};
use std::fmt;

// LOG FORMAT //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Syslog,
    ApacheCommon,
    ApacheCombined,
    Nginx,
    WindowsEvent,
    Unknown,
}

impl LogFormat {
    /// Formats the detector votes on, in tie-break priority order
    pub const DETECTABLE: [LogFormat; 5] = [
        LogFormat::Syslog,
        LogFormat::ApacheCombined,
        LogFormat::ApacheCommon,
        LogFormat::Nginx,
        LogFormat::WindowsEvent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogFormat::Syslog => "syslog",
            LogFormat::ApacheCommon => "apache_common",
            LogFormat::ApacheCombined => "apache_combined",
            LogFormat::Nginx => "nginx",
            LogFormat::WindowsEvent => "windows_event",
            LogFormat::Unknown => "unknown",
        }
    }

    /// Parse a format name (case-insensitive, `-` and `_` interchangeable)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "syslog" => Some(LogFormat::Syslog),
            "apache_common" | "common" => Some(LogFormat::ApacheCommon),
            "apache_combined" | "combined" | "apache" => Some(LogFormat::ApacheCombined),
            "nginx" => Some(LogFormat::Nginx),
            "windows_event" | "windows" => Some(LogFormat::WindowsEvent),
            "unknown" => Some(LogFormat::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// TOKENS //

/// Provisional fields pulled out of one line, still in the format's own vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens<'a> {
    pub timestamp: Option<&'a str>,
    pub severity: Option<&'a str>,
    pub source: Option<&'a str>,
    pub message: &'a str,
    pub fields: Vec<(&'static str, &'a str)>,
    pub matched: bool,
}

impl<'a> Tokens<'a> {
    /// The whole line as message, nothing else extracted
    pub fn unmatched(line: &'a str) -> Self {
        Self {
            message: line,
            ..Default::default()
        }
    }
}

// Grammar trait - one implementation per format

pub trait Grammar: Send + Sync {
    fn format(&self) -> LogFormat;

    /// Whether the line has this format's shape. Callers strip trailing whitespace.
    fn is_match(&self, line: &str) -> bool;

    /// Extract fields, `None` when the line does not have this format's shape
    fn tokenize<'a>(&self, line: &'a str) -> Option<Tokens<'a>>;

    /// Map a native severity token to the canonical scale
    fn severity(&self, token: &str) -> Option<Severity>;

    /// Parse the format's canonical timestamp layout
    fn timestamp(&self, text: &str) -> Option<DateTime<Utc>>;
}

// Non-empty named capture
pub(crate) fn capture<'a>(caps: &Captures<'a>, name: &str) -> Option<&'a str> {
    caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

// Case-insensitive lookup in a static severity table
pub(crate) fn lookup(table: &[(&str, Severity)], token: &str) -> Option<Severity> {
    table
        .iter()
        .find(|(word, _)| word.eq_ignore_ascii_case(token))
        .map(|(_, severity)| *severity)
}

// GRAMMAR SET //

/// Compiled grammars for every detectable format
pub struct GrammarSet {
    syslog: SyslogGrammar,
    apache_common: ApacheGrammar,
    apache_combined: ApacheGrammar,
    nginx: NginxGrammar,
    windows: WindowsEventGrammar,
}

impl GrammarSet {
    pub fn new(timestamps: &TimestampConfig) -> Self {
        Self {
            syslog: SyslogGrammar::new(timestamps.syslog_year),
            apache_common: ApacheGrammar::common(),
            apache_combined: ApacheGrammar::combined(),
            nginx: NginxGrammar::new(),
            windows: WindowsEventGrammar::new(),
        }
    }

    /// Grammar for a format, `None` for `Unknown`
    pub fn get(&self, format: LogFormat) -> Option<&dyn Grammar> {
        match format {
            LogFormat::Syslog => Some(&self.syslog),
            LogFormat::ApacheCommon => Some(&self.apache_common),
            LogFormat::ApacheCombined => Some(&self.apache_combined),
            LogFormat::Nginx => Some(&self.nginx),
            LogFormat::WindowsEvent => Some(&self.windows),
            LogFormat::Unknown => None,
        }
    }

    /// Detectable grammars in priority order
    pub fn detectable(&self) -> impl Iterator<Item = &dyn Grammar> + '_ {
        LogFormat::DETECTABLE
            .iter()
            .filter_map(move |format| self.get(*format))
    }
}

impl Default for GrammarSet {
    fn default() -> Self {
        Self::new(&TimestampConfig::default())
    }
}
