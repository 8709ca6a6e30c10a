// Windows event log export grammar
// 2026-01-27 10:15:23 Error Service-Control-Manager The service terminated unexpectedly

use super::{capture, lookup, Grammar, LogFormat, Tokens};
use crate::Severity;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

// Event Level numbers (0 is LogAlways)
const EVENT_LEVELS: [Severity; 6] = [
    Severity::Info,
    Severity::Critical,
    Severity::Error,
    Severity::Warning,
    Severity::Info,
    Severity::Debug, // Verbose
];

const EVENT_LEVEL_WORDS: &[(&str, Severity)] = &[
    ("critical", Severity::Critical),
    ("error", Severity::Error),
    ("warning", Severity::Warning),
    ("information", Severity::Info),
    ("verbose", Severity::Debug),
];

pub struct WindowsEventGrammar {
    pattern: Regex,
}

impl WindowsEventGrammar {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"^(?P<timestamp>\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?)\s+(?P<level>[A-Za-z]+|\d)\s+(?P<source>\S+)(?:\s+(?P<message>.*))?$",
            )
            .expect("windows event pattern compiles"),
        }
    }
}

impl Default for WindowsEventGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for WindowsEventGrammar {
    fn format(&self) -> LogFormat {
        LogFormat::WindowsEvent
    }

    fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn tokenize<'a>(&self, line: &'a str) -> Option<Tokens<'a>> {
        let caps = self.pattern.captures(line)?;

        Some(Tokens {
            timestamp: capture(&caps, "timestamp"),
            severity: capture(&caps, "level"),
            source: capture(&caps, "source"),
            message: caps.name("message").map_or("", |m| m.as_str()),
            fields: Vec::new(),
            matched: true,
        })
    }

    fn severity(&self, token: &str) -> Option<Severity> {
        match token.parse::<usize>() {
            Ok(level) => EVENT_LEVELS.get(level).copied(),
            Err(_) => lookup(EVENT_LEVEL_WORDS, token).or_else(|| Severity::from_word(token)),
        }
    }

    fn timestamp(&self, text: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&text.replacen('T', " ", 1), "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
