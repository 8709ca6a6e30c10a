//! Query engine - read-only filters and statistics over a record store

use crate::error::SiftError;
use crate::{LogRecord, Severity};
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DEFAULT_REPORT_LIMIT: usize = 50;

/// How `filter_by_keyword` interprets its pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    #[default]
    Literal, // case-insensitive substring
    Regex,
}

pub struct QueryEngine<'s> {
    records: &'s [LogRecord],
}

impl<'s> QueryEngine<'s> {
    pub fn new(records: &'s [LogRecord]) -> Self {
        Self { records }
    }

    /// Records with exactly this severity, in store order
    pub fn filter_by_level(&self, level: Severity) -> Vec<&'s LogRecord> {
        self.records.iter().filter(|r| r.severity == level).collect()
    }

    /// Records at or above `level` on the ordered scale. `Unknown` records never match.
    pub fn filter_at_least(&self, level: Severity) -> Vec<&'s LogRecord> {
        let Some(min) = level.rank() else {
            return Vec::new();
        };
        self.records
            .iter()
            .filter(|r| r.severity.rank().is_some_and(|rank| rank >= min))
            .collect()
    }

    /// Search the raw line text.
    ///
    /// Literal mode is a case-insensitive substring test. Regex mode compiles `pattern`
    /// case-insensitively and fails with [`SiftError::InvalidPattern`] if it does not compile.
    pub fn filter_by_keyword(
        &self,
        pattern: &str,
        mode: KeywordMode,
    ) -> Result<Vec<&'s LogRecord>, SiftError> {
        match mode {
            KeywordMode::Literal => {
                let needle = pattern.to_lowercase();
                Ok(self
                    .records
                    .iter()
                    .filter(|r| r.raw.to_lowercase().contains(&needle))
                    .collect())
            }
            KeywordMode::Regex => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| SiftError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })?;
                Ok(self.records.iter().filter(|r| regex.is_match(&r.raw)).collect())
            }
        }
    }

    /// Records whose timestamp lies within the inclusive bounds
    pub fn filter_by_time(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<&'s LogRecord> {
        self.records
            .iter()
            .filter(|r| match r.timestamp {
                Some(ts) => from.map_or(true, |f| ts >= f) && to.map_or(true, |t| ts <= t),
                None => false,
            })
            .collect()
    }

    pub fn get_summary(&self) -> Summary {
        let mut summary = Summary::default();
        for record in self.records {
            summary.add(record);
        }
        summary.refresh_derived();
        summary
    }

    /// Most frequent messages, ties broken by first appearance
    pub fn top_messages(&self, n: usize) -> Vec<(&'s str, usize)> {
        let mut counts: HashMap<&'s str, (usize, usize)> = HashMap::new(); // count, first index
        for (index, record) in self.records.iter().enumerate() {
            counts.entry(record.message.as_str()).or_insert((0, index)).0 += 1;
        }

        let mut ranked: Vec<(&'s str, usize, usize)> = counts
            .into_iter()
            .map(|(message, (count, first))| (message, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(n)
            .map(|(message, count, _)| (message, count))
            .collect()
    }

    /// ERROR and CRITICAL records, at most `limit` of them listed
    pub fn error_report(&self, limit: usize) -> ErrorReport<'s> {
        let errors = self.filter_at_least(Severity::Error);
        let total = errors.len();
        let entries: Vec<&'s LogRecord> = errors.into_iter().take(limit).collect();
        ErrorReport {
            total,
            omitted: total - entries.len(),
            entries,
        }
    }
}

// SUMMARY //

/// Statistics over one store, ready for rendering by a report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub by_level: BTreeMap<Severity, usize>, // every level present, zero counts included
    pub missing_timestamps: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub unique_sources: usize,
    pub error_rate: f64, // percent of ERROR + CRITICAL

    // kept so merged summaries still count distinct sources
    #[serde(default)]
    sources: BTreeSet<String>,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            total: 0,
            by_level: Severity::ALL.iter().map(|s| (*s, 0)).collect(),
            missing_timestamps: 0,
            earliest: None,
            latest: None,
            unique_sources: 0,
            error_rate: 0.0,
            sources: BTreeSet::new(),
        }
    }
}

impl Summary {
    fn add(&mut self, record: &LogRecord) {
        self.total += 1;
        *self.by_level.entry(record.severity).or_insert(0) += 1;

        match record.timestamp {
            Some(ts) => {
                self.earliest = Some(self.earliest.map_or(ts, |e| e.min(ts)));
                self.latest = Some(self.latest.map_or(ts, |l| l.max(ts)));
            }
            None => self.missing_timestamps += 1,
        }

        if let Some(source) = &record.source {
            if !self.sources.contains(source) {
                self.sources.insert(source.clone());
            }
        }
    }

    fn refresh_derived(&mut self) {
        self.unique_sources = self.sources.len();
        self.error_rate = if self.total > 0 {
            (self.count(Severity::Error) + self.count(Severity::Critical)) as f64
                / self.total as f64
                * 100.0
        } else {
            0.0
        };
    }

    pub fn count(&self, level: Severity) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }

    /// Fold another session's summary into this one
    pub fn merge(&mut self, other: &Summary) {
        self.total += other.total;
        for (level, count) in &other.by_level {
            *self.by_level.entry(*level).or_insert(0) += count;
        }
        self.missing_timestamps += other.missing_timestamps;
        self.earliest = match (self.earliest, other.earliest) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.latest = match (self.latest, other.latest) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.sources.extend(other.sources.iter().cloned());
        self.refresh_derived();
    }
}

/// Error-level records for a report generator
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport<'s> {
    pub total: usize,
    pub entries: Vec<&'s LogRecord>,
    pub omitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawLine;
    use chrono::TimeZone;

    fn record(line: usize, severity: Severity, minute: Option<u32>, message: &str) -> LogRecord {
        LogRecord {
            line_number: line,
            timestamp: minute.map(|m| Utc.with_ymd_and_hms(2026, 1, 27, 10, m, 0).unwrap()),
            severity,
            source: Some(format!("svc{}", line % 2)),
            message: message.to_string(),
            raw: format!("raw {} {}", line, message),
            fields: HashMap::new(),
        }
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            record(1, Severity::Info, Some(5), "started"),
            record(2, Severity::Error, Some(1), "Failed login"),
            record(3, Severity::Warning, None, "disk at 85%"),
            record(4, Severity::Critical, Some(9), "FAILED twice"),
            record(5, Severity::Info, Some(7), "started"),
            LogRecord::unparsed(RawLine::new(6, "###garbage###")),
        ]
    }

    #[test]
    fn test_filter_by_level_is_exact() {
        let records = sample();
        let query = QueryEngine::new(&records);
        let errors = query.filter_by_level(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_number, 2);
        assert!(query.filter_by_level(Severity::Debug).is_empty());
        assert_eq!(query.filter_by_level(Severity::Unknown).len(), 1);
    }

    #[test]
    fn test_filter_at_least() {
        let records = sample();
        let query = QueryEngine::new(&records);
        let lines: Vec<usize> = query
            .filter_at_least(Severity::Warning)
            .iter()
            .map(|r| r.line_number)
            .collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(query.filter_at_least(Severity::Unknown).is_empty());
    }

    #[test]
    fn test_literal_keyword_is_case_insensitive() {
        let records = sample();
        let query = QueryEngine::new(&records);
        let hits = query.filter_by_keyword("failed", KeywordMode::Literal).unwrap();
        let lines: Vec<usize> = hits.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_regex_keyword() {
        let records = sample();
        let query = QueryEngine::new(&records);
        let hits = query.filter_by_keyword(r"^raw [15] ", KeywordMode::Regex).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let records = sample();
        let query = QueryEngine::new(&records);
        match query.filter_by_keyword("[", KeywordMode::Regex) {
            Err(SiftError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "["),
            other => panic!("expected invalid pattern, got {:?}", other.map(|v| v.len())),
        }
        // literal mode treats the same text as plain characters
        assert!(query.filter_by_keyword("[", KeywordMode::Literal).unwrap().is_empty());
    }

    #[test]
    fn test_filter_by_time() {
        let records = sample();
        let query = QueryEngine::new(&records);
        let from = Utc.with_ymd_and_hms(2026, 1, 27, 10, 5, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 1, 27, 10, 7, 0).unwrap();
        let lines: Vec<usize> = query
            .filter_by_time(Some(from), Some(to))
            .iter()
            .map(|r| r.line_number)
            .collect();
        assert_eq!(lines, vec![1, 5]);
        assert_eq!(query.filter_by_time(None, None).len(), 4);
    }

    #[test]
    fn test_summary() {
        let records = sample();
        let summary = QueryEngine::new(&records).get_summary();
        assert_eq!(summary.total, 6);
        assert_eq!(summary.by_level.values().sum::<usize>(), 6);
        assert_eq!(summary.count(Severity::Info), 2);
        assert_eq!(summary.count(Severity::Debug), 0);
        assert_eq!(summary.by_level.len(), 6);
        assert_eq!(summary.missing_timestamps, 2);
        assert_eq!(summary.earliest.map(|t| t.format("%M").to_string()).as_deref(), Some("01"));
        assert_eq!(summary.latest.map(|t| t.format("%M").to_string()).as_deref(), Some("09"));
        assert_eq!(summary.unique_sources, 2);
        assert!((summary.error_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_empty_store() {
        let summary = QueryEngine::new(&[]).get_summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.error_rate, 0.0);
        assert!(summary.earliest.is_none());
        assert!(summary.latest.is_none());
    }

    #[test]
    fn test_summary_is_order_independent() {
        let records = sample();
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(
            QueryEngine::new(&records).get_summary(),
            QueryEngine::new(&reversed).get_summary()
        );
    }

    #[test]
    fn test_merge_summaries() {
        let records = sample();
        let (left, right) = records.split_at(3);
        let mut merged = QueryEngine::new(left).get_summary();
        merged.merge(&QueryEngine::new(right).get_summary());
        assert_eq!(merged, QueryEngine::new(&records).get_summary());
    }

    #[test]
    fn test_merge_after_json_round_trip() {
        let records = sample();
        let (left, right) = records.split_at(3);

        let json = serde_json::to_string(&QueryEngine::new(left).get_summary()).unwrap();
        let restored: Summary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.unique_sources, 2);

        let mut merged = Summary::default();
        merged.merge(&restored);
        assert_eq!(merged.unique_sources, 2);

        merged.merge(&QueryEngine::new(right).get_summary());
        assert_eq!(merged, QueryEngine::new(&records).get_summary());
    }

    #[test]
    fn test_top_messages() {
        let records = sample();
        let top = QueryEngine::new(&records).top_messages(2);
        assert_eq!(top, vec![("started", 2), ("Failed login", 1)]);
    }

    #[test]
    fn test_error_report_limit() {
        let records = sample();
        let report = QueryEngine::new(&records).error_report(1);
        assert_eq!(report.total, 2);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].line_number, 2);
        assert_eq!(report.omitted, 1);
    }
}
