// Syslog grammar (RFC 3164 / BSD format)

use super::{capture, lookup, Grammar, LogFormat, Tokens};
use crate::Severity;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use regex::Regex;

// Severity part of the PRI value (priority % 8)
const PRIORITY_LEVELS: [Severity; 8] = [
    Severity::Critical, // Emergency
    Severity::Critical, // Alert
    Severity::Critical, // Critical
    Severity::Error,
    Severity::Warning,
    Severity::Info, // Notice
    Severity::Info,
    Severity::Debug,
];

// Bracketed level words, e.g. "sshd[42]: [warning] ..."
const LEVEL_WORDS: &[(&str, Severity)] = &[
    ("emerg", Severity::Critical),
    ("emergency", Severity::Critical),
    ("alert", Severity::Critical),
    ("crit", Severity::Critical),
    ("critical", Severity::Critical),
    ("fatal", Severity::Critical),
    ("err", Severity::Error),
    ("error", Severity::Error),
    ("warn", Severity::Warning),
    ("warning", Severity::Warning),
    ("notice", Severity::Info),
    ("info", Severity::Info),
    ("debug", Severity::Debug),
];

// PRI / 8, facilities 0 (kern) through 23 (local7)
const FACILITY_CODES: [&str; 24] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
    "17", "18", "19", "20", "21", "22", "23",
];

pub struct SyslogGrammar {
    // <priority>Mon DD HH:MM:SS hostname process[pid]: [level] message
    pattern: Regex,
    year: Option<i32>,
}

impl SyslogGrammar {
    pub fn new(year: Option<i32>) -> Self {
        Self {
            pattern: Regex::new(
                r"^(?:<(?P<priority>\d{1,3})>)?(?P<timestamp>[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<hostname>\S+)\s+(?P<process>[^\s\[:]+)(?:\[(?P<pid>\d+)\])?:\s*(?:\[(?P<level>[A-Za-z]+)\]\s*)?(?P<message>.*)$",
            )
            .expect("syslog pattern compiles"),
            year,
        }
    }

    fn priority_to_level(priority: u16) -> Option<Severity> {
        // PRI is facility * 8 + severity, facilities stop at 23
        if priority > 191 {
            return None;
        }
        Some(PRIORITY_LEVELS[(priority % 8) as usize])
    }
}

impl Grammar for SyslogGrammar {
    fn format(&self) -> LogFormat {
        LogFormat::Syslog
    }

    fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn tokenize<'a>(&self, line: &'a str) -> Option<Tokens<'a>> {
        let caps = self.pattern.captures(line)?;

        let priority = capture(&caps, "priority");
        let mut fields = Vec::new();
        if let Some(hostname) = capture(&caps, "hostname") {
            fields.push(("hostname", hostname));
        }
        if let Some(pid) = capture(&caps, "pid") {
            fields.push(("pid", pid));
        }
        if let Some(pri) = priority {
            fields.push(("priority", pri));
            let facility = pri
                .parse::<usize>()
                .ok()
                .and_then(|p| FACILITY_CODES.get(p / 8).copied());
            if let Some(facility) = facility {
                fields.push(("facility", facility));
            }
        }

        Some(Tokens {
            timestamp: capture(&caps, "timestamp"),
            severity: priority.or_else(|| capture(&caps, "level")),
            source: capture(&caps, "process"),
            message: caps.name("message").map_or("", |m| m.as_str()),
            fields,
            matched: true,
        })
    }

    fn severity(&self, token: &str) -> Option<Severity> {
        match token.parse::<u16>() {
            Ok(priority) => Self::priority_to_level(priority),
            Err(_) => lookup(LEVEL_WORDS, token),
        }
    }

    fn timestamp(&self, text: &str) -> Option<DateTime<Utc>> {
        // Format: Oct 11 22:14:15 (no year), day may be space padded
        let year = self.year.unwrap_or_else(|| Utc::now().year());
        let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDateTime::parse_from_str(&format!("{} {}", compact, year), "%b %d %H:%M:%S %Y")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_priority_line() {
        let grammar = SyslogGrammar::new(Some(2024));
        let tokens = grammar
            .tokenize("<34>Oct 11 22:14:15 mymachine su[12345]: 'su root' failed for lonvick")
            .unwrap();
        assert_eq!(tokens.severity, Some("34"));
        assert_eq!(tokens.source, Some("su"));
        assert_eq!(tokens.message, "'su root' failed for lonvick");
        assert!(tokens.fields.contains(&("hostname", "mymachine")));
        assert!(tokens.fields.contains(&("pid", "12345")));
        // 34 / 8 = 4 (auth)
        assert!(tokens.fields.contains(&("facility", "4")));
        // 34 % 8 = 2
        assert_eq!(grammar.severity("34"), Some(Severity::Critical));
    }

    #[test]
    fn test_facility_needs_valid_priority() {
        let grammar = SyslogGrammar::new(Some(2024));
        let local7 = grammar
            .tokenize("<191>Oct 11 22:14:15 host app: debug trace")
            .unwrap();
        assert!(local7.fields.contains(&("facility", "23")));

        let out_of_range = grammar
            .tokenize("<200>Oct 11 22:14:15 host app: bogus")
            .unwrap();
        assert!(!out_of_range.fields.iter().any(|(name, _)| *name == "facility"));

        let bare = grammar.tokenize("Oct 11 22:14:15 host app: no pri").unwrap();
        assert!(!bare.fields.iter().any(|(name, _)| *name == "facility"));
    }

    #[test]
    fn test_priority_table() {
        let grammar = SyslogGrammar::new(None);
        assert_eq!(grammar.severity("11"), Some(Severity::Error));
        assert_eq!(grammar.severity("12"), Some(Severity::Warning));
        assert_eq!(grammar.severity("13"), Some(Severity::Info));
        assert_eq!(grammar.severity("15"), Some(Severity::Debug));
        assert_eq!(grammar.severity("999"), None);
    }

    #[test]
    fn test_bracketed_level() {
        let grammar = SyslogGrammar::new(None);
        let tokens = grammar
            .tokenize("Feb  8 14:30:00 web nginx[1234]: [warning] upstream slow")
            .unwrap();
        assert_eq!(tokens.severity, Some("warning"));
        assert_eq!(tokens.message, "upstream slow");
        assert_eq!(grammar.severity("WARNING"), Some(Severity::Warning));
    }

    #[test]
    fn test_kernel_line_without_pid() {
        let grammar = SyslogGrammar::new(None);
        let tokens = grammar
            .tokenize("Jul 27 14:41:58 combo kernel: PCI: Using configuration type 1")
            .unwrap();
        assert_eq!(tokens.source, Some("kernel"));
        assert_eq!(tokens.severity, None);
        assert_eq!(tokens.message, "PCI: Using configuration type 1");
    }

    #[test]
    fn test_timestamp_with_configured_year() {
        let grammar = SyslogGrammar::new(Some(2023));
        let ts = grammar.timestamp("Jan  2 03:04:05").unwrap();
        assert_eq!(ts.year(), 2023);
        assert_eq!(ts.day(), 2);
        assert_eq!(ts.hour(), 3);
        assert!(grammar.timestamp("Feb 29 00:00:00").is_none());
    }

    #[test]
    fn test_rejects_other_shapes() {
        let grammar = SyslogGrammar::new(None);
        assert!(!grammar.is_match("2024/02/08 10:30:00 [error] 1#0: boom"));
        assert!(grammar.tokenize("###garbage###").is_none());
    }
}
