//! Record normalizer - canonical severity and UTC timestamps

use crate::config::InferenceConfig;
use crate::parser::{Grammar, Tokens};
use crate::{LogRecord, RawLine, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;

pub struct Normalizer {
    // lowercased, most severe list first
    rules: Vec<(Severity, Vec<String>)>,
}

impl Normalizer {
    pub fn new(config: &InferenceConfig) -> Self {
        let rules = config
            .rules()
            .iter()
            .map(|(severity, words)| {
                let words = words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (*severity, words)
            })
            .collect();
        Self { rules }
    }

    /// Guess a severity from message text, `Unknown` when no configured word occurs.
    pub fn infer(&self, message: &str) -> Severity {
        let lower = message.to_lowercase();
        self.rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w.as_str())))
            .map_or(Severity::Unknown, |(severity, _)| *severity)
    }

    /// Build the stored record for one tokenized line.
    pub fn normalize(
        &self,
        line: &RawLine,
        tokens: Tokens<'_>,
        grammar: Option<&dyn Grammar>,
    ) -> LogRecord {
        let grammar = match grammar {
            Some(g) if tokens.matched => g,
            _ => return LogRecord::unparsed(line.clone()),
        };

        let severity = tokens
            .severity
            .and_then(|token| grammar.severity(token))
            .unwrap_or_else(|| self.infer(tokens.message));

        let timestamp = tokens
            .timestamp
            .and_then(|text| grammar.timestamp(text).or_else(|| parse_generic_timestamp(text)));

        // nothing usable recovered, keep the fallback shape
        if severity == Severity::Unknown && timestamp.is_none() {
            return LogRecord::unparsed(line.clone());
        }

        let fields: HashMap<String, serde_json::Value> = tokens
            .fields
            .iter()
            .map(|(name, value)| (name.to_string(), field_value(value)))
            .collect();

        LogRecord {
            line_number: line.number,
            timestamp,
            severity,
            source: tokens.source.map(str::to_string),
            message: tokens.message.to_string(),
            raw: line.text.clone(),
            fields,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

// numbers stay numbers
fn field_value(value: &str) -> serde_json::Value {
    match value.parse::<u64>() {
        Ok(n) => serde_json::json!(n),
        Err(_) => serde_json::json!(value),
    }
}

/// Layouts tried after a grammar's own layout fails. Zone-less times are read as UTC.
pub fn parse_generic_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
                .map(|naive| naive.and_utc())
        })
}
