// Nginx error log grammar
// 2024/02/08 10:30:00 [error] 12345#0: *1234 open() "/var/www/html/favicon.ico" failed

use super::{capture, lookup, Grammar, LogFormat, Tokens};
use crate::Severity;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

const NGINX_LEVELS: &[(&str, Severity)] = &[
    ("debug", Severity::Debug),
    ("info", Severity::Info),
    ("notice", Severity::Info),
    ("warn", Severity::Warning),
    ("error", Severity::Error),
    ("crit", Severity::Critical),
    ("alert", Severity::Critical),
    ("emerg", Severity::Critical),
];

pub struct NginxGrammar {
    pattern: Regex,
}

impl NginxGrammar {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"^(?P<timestamp>\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}) \[(?P<level>[a-z]+)\] (?P<worker>(?P<pid>\d+)#(?P<tid>\d+)):\s*(?:\*(?P<connection>\d+) )?(?P<message>.*)$",
            )
            .expect("nginx pattern compiles"),
        }
    }
}

impl Default for NginxGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for NginxGrammar {
    fn format(&self) -> LogFormat {
        LogFormat::Nginx
    }

    fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn tokenize<'a>(&self, line: &'a str) -> Option<Tokens<'a>> {
        let caps = self.pattern.captures(line)?;

        let mut fields = Vec::new();
        for name in ["pid", "tid", "connection"] {
            if let Some(value) = capture(&caps, name) {
                fields.push((name, value));
            }
        }

        Some(Tokens {
            timestamp: capture(&caps, "timestamp"),
            severity: capture(&caps, "level"),
            source: capture(&caps, "worker"),
            message: caps.name("message").map_or("", |m| m.as_str()),
            fields,
            matched: true,
        })
    }

    fn severity(&self, token: &str) -> Option<Severity> {
        lookup(NGINX_LEVELS, token)
    }

    fn timestamp(&self, text: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(text, "%Y/%m/%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_line() {
        let grammar = NginxGrammar::new();
        let raw = r#"2024/02/08 10:30:00 [error] 12345#0: *1234 open() "/var/www/html/favicon.ico" failed"#;
        let tokens = grammar.tokenize(raw).unwrap();
        assert_eq!(tokens.severity, Some("error"));
        assert_eq!(tokens.source, Some("12345#0"));
        assert!(tokens.message.contains("favicon.ico"));
        assert!(tokens.fields.contains(&("pid", "12345")));
        assert!(tokens.fields.contains(&("connection", "1234")));
        assert!(grammar.timestamp(tokens.timestamp.unwrap()).is_some());
    }

    #[test]
    fn test_level_table() {
        let grammar = NginxGrammar::new();
        assert_eq!(grammar.severity("notice"), Some(Severity::Info));
        assert_eq!(grammar.severity("crit"), Some(Severity::Critical));
        assert_eq!(grammar.severity("emerg"), Some(Severity::Critical));
        assert_eq!(grammar.severity("verbose"), None);
    }

    #[test]
    fn test_access_line_is_not_nginx_error_log() {
        let grammar = NginxGrammar::new();
        assert!(!grammar.is_match(
            r#"192.168.1.1 - - [08/Feb/2024:10:30:00 +0000] "GET /api/users HTTP/1.1" 200 1234"#
        ));
    }
}
