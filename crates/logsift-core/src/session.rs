//! Parse sessions: detect once, then tokenize and normalize every line in order

use crate::config::EngineConfig;
use crate::detector::{Detection, FormatDetector};
use crate::error::{PartialParse, SiftError};
use crate::normalizer::Normalizer;
use crate::parser::{GrammarSet, LogFormat};
use crate::query::QueryEngine;
use crate::store::RecordStore;
use crate::tokenizer::tokenize;
use crate::{LogRecord, RawLine};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Compiled grammars plus configuration. Immutable, so one engine can serve
/// any number of sessions running in parallel.
pub struct LogEngine {
    grammars: GrammarSet,
    detector: FormatDetector,
    normalizer: Normalizer,
}

impl LogEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            grammars: GrammarSet::new(&config.timestamps),
            detector: FormatDetector::new(&config.detection),
            normalizer: Normalizer::new(&config.inference),
        }
    }

    pub fn grammars(&self) -> &GrammarSet {
        &self.grammars
    }

    /// Run format detection on a sample of lines
    pub fn detect(&self, sample: &[&str]) -> Detection {
        self.detector.detect(&self.grammars, sample)
    }

    /// Tokenize and normalize one line under `format`
    pub fn process_line(&self, format: LogFormat, line: &RawLine) -> LogRecord {
        let grammar = self.grammars.get(format);
        let tokens = tokenize(grammar, line);
        self.normalizer.normalize(line, tokens, grammar)
    }

    /// Open and parse a file. The handle is closed on return, including on read faults.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParseSession, PartialParse> {
        self.parse_reader(Self::open(path.as_ref())?)
    }

    /// Open and parse a file with a caller-chosen format
    pub fn parse_file_as<P: AsRef<Path>>(
        &self,
        path: P,
        format: LogFormat,
    ) -> Result<ParseSession, PartialParse> {
        self.parse_reader_as(Self::open(path.as_ref())?, format)
    }

    fn open(path: &Path) -> Result<File, PartialParse> {
        File::open(path).map_err(|source| PartialParse {
            session: ParseSession::new(Detection::unknown(0), 0),
            error: SiftError::StreamRead {
                lines_processed: 0,
                source,
            },
        })
    }

    /// Parse a byte stream. Invalid UTF-8 is replaced per line, never fatal.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParseSession, PartialParse> {
        self.run(LossyLines::new(BufReader::new(reader)), None)
    }

    /// Parse a byte stream with a caller-chosen format, skipping detection
    pub fn parse_reader_as<R: Read>(
        &self,
        reader: R,
        format: LogFormat,
    ) -> Result<ParseSession, PartialParse> {
        self.run(LossyLines::new(BufReader::new(reader)), Some(format))
    }

    /// Parse in-memory text
    pub fn parse_str(&self, text: &str) -> ParseSession {
        let lines = text.lines().map(|line| Ok(line.to_string()));
        match self.run(lines, None) {
            Ok(session) => session,
            // no I/O happens on a &str
            Err(partial) => partial.session,
        }
    }

    fn run<I>(&self, mut lines: I, forced: Option<LogFormat>) -> Result<ParseSession, PartialParse>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        // detection sample is buffered, then replayed through the pipeline
        let mut prefix = Vec::with_capacity(self.detector.sample_size());
        let mut fault = None;
        while prefix.len() < self.detector.sample_size() {
            match lines.next() {
                Some(Ok(line)) => prefix.push(line),
                Some(Err(e)) => {
                    fault = Some(e);
                    break;
                }
                None => break,
            }
        }

        let detection = match forced {
            Some(format) => Detection {
                format,
                ratio: 1.0,
                sampled: 0,
            },
            None => {
                let sample: Vec<&str> = prefix.iter().map(String::as_str).collect();
                self.detect(&sample)
            }
        };

        let mut session = ParseSession::new(detection, prefix.len());
        debug!(
            session = %session.id,
            format = %detection.format,
            ratio = detection.ratio,
            sampled = detection.sampled,
            "format detected"
        );

        for text in prefix {
            session.ingest(self, text);
        }
        if fault.is_none() {
            for next in lines {
                match next {
                    Ok(text) => session.ingest(self, text),
                    Err(e) => {
                        fault = Some(e);
                        break;
                    }
                }
            }
        }

        match fault {
            Some(source) => {
                warn!(
                    session = %session.id,
                    lines_processed = session.len(),
                    error = %source,
                    "log stream read failed"
                );
                Err(PartialParse {
                    error: SiftError::StreamRead {
                        lines_processed: session.len(),
                        source,
                    },
                    session,
                })
            }
            None => {
                debug!(session = %session.id, records = session.len(), "session complete");
                Ok(session)
            }
        }
    }
}

impl Default for LogEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

// SESSION //

/// Result of one parse pass over one input
#[derive(Debug)]
pub struct ParseSession {
    id: Uuid,
    detection: Detection,
    store: RecordStore,
}

impl ParseSession {
    fn new(detection: Detection, capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            detection,
            store: RecordStore::with_capacity(capacity),
        }
    }

    fn ingest(&mut self, engine: &LogEngine, text: String) {
        let line = RawLine::new(self.store.len() + 1, text);
        let record = engine.process_line(self.detection.format, &line);
        self.store.push(record);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn format(&self) -> LogFormat {
        self.detection.format
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(self.store.as_slice())
    }

    pub fn into_store(self) -> RecordStore {
        self.store
    }
}

// LINE READER //

/// Physical lines of a byte stream, `\n` or `\r\n` terminated, decoded lossily.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
