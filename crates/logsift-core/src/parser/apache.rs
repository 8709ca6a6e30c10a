// Apache access log grammars (Common and Combined Log Format)

use super::{capture, Grammar, LogFormat, Tokens};
use crate::Severity;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

const COMMON_PATTERN: &str = r#"^(?P<host>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<timestamp>[^\]]+)\] "(?P<request>[^"]*)" (?P<status>\d{3}) (?P<bytes>\d+|-)"#;
const COMBINED_SUFFIX: &str = r#" "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)""#;

pub struct ApacheGrammar {
    format: LogFormat,
    pattern: Regex,
}

impl ApacheGrammar {
    /// 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326
    pub fn common() -> Self {
        Self {
            format: LogFormat::ApacheCommon,
            pattern: Regex::new(&format!("{}$", COMMON_PATTERN))
                .expect("apache common pattern compiles"),
        }
    }

    /// Common format followed by "referer" "user agent"
    pub fn combined() -> Self {
        Self {
            format: LogFormat::ApacheCombined,
            pattern: Regex::new(&format!("{}{}$", COMMON_PATTERN, COMBINED_SUFFIX))
                .expect("apache combined pattern compiles"),
        }
    }

    pub(crate) fn status_to_level(status: u16) -> Option<Severity> {
        match status {
            100..=399 => Some(Severity::Info),
            400..=499 => Some(Severity::Warning),
            500..=599 => Some(Severity::Error),
            _ => None,
        }
    }

    pub(crate) fn parse_clf_timestamp(ts: &str) -> Option<DateTime<Utc>> {
        // Format: 10/Oct/2000:13:55:36 -0700
        DateTime::parse_from_str(ts, "%d/%b/%Y:%H:%M:%S %z")
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                // zone missing, read as UTC
                NaiveDateTime::parse_from_str(
                    ts.split_whitespace().next().unwrap_or(ts),
                    "%d/%b/%Y:%H:%M:%S",
                )
                .ok()
                .map(|naive| naive.and_utc())
            })
    }
}

impl Grammar for ApacheGrammar {
    fn format(&self) -> LogFormat {
        self.format
    }

    fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn tokenize<'a>(&self, line: &'a str) -> Option<Tokens<'a>> {
        let caps = self.pattern.captures(line)?;

        let mut fields = Vec::new();
        // "-" marks an absent value in CLF
        for name in ["user", "status", "bytes", "referer", "user_agent"] {
            if let Some(value) = capture(&caps, name).filter(|v| *v != "-") {
                fields.push((name, value));
            }
        }

        Some(Tokens {
            timestamp: capture(&caps, "timestamp"),
            severity: capture(&caps, "status"),
            source: capture(&caps, "host"),
            message: caps.name("request").map_or("", |m| m.as_str()),
            fields,
            matched: true,
        })
    }

    fn severity(&self, token: &str) -> Option<Severity> {
        token.parse::<u16>().ok().and_then(Self::status_to_level)
    }

    fn timestamp(&self, text: &str) -> Option<DateTime<Utc>> {
        Self::parse_clf_timestamp(text)
    }
}
