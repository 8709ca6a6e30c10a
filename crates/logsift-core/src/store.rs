// Record store - append-only, insertion ordered

use crate::LogRecord;
use std::ops::Index;

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<LogRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    // only the parse pass appends
    pub(crate) fn push(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&LogRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}

impl Index<usize> for RecordStore {
    type Output = LogRecord;

    fn index(&self, index: usize) -> &LogRecord {
        &self.records[index]
    }
}

impl<'s> IntoIterator for &'s RecordStore {
    type Item = &'s LogRecord;
    type IntoIter = std::slice::Iter<'s, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
