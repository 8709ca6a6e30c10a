// Error types surfaced by the engine

use crate::session::ParseSession;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("failed to read log stream after {lines_processed} lines: {source}")]
    StreamRead {
        lines_processed: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl SiftError {
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, SiftError::InvalidPattern { .. })
    }
}

/// A parse aborted by an I/O fault. `session` holds every line read before it.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PartialParse {
    pub session: ParseSession,
    #[source]
    pub error: SiftError,
}

impl PartialParse {
    pub fn lines_processed(&self) -> usize {
        self.session.len()
    }
}
