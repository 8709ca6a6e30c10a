//! Format detection by match-ratio voting over a sample of leading lines

use crate::config::DetectionConfig;
use crate::parser::{GrammarSet, LogFormat};
use serde::Serialize;
use tracing::debug;

/// Outcome of a detection pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub format: LogFormat,
    pub ratio: f64,     // share of non-blank sampled lines the winning grammar matched
    pub sampled: usize, // non-blank lines considered
}

impl Detection {
    pub fn unknown(sampled: usize) -> Self {
        Self {
            format: LogFormat::Unknown,
            ratio: 0.0,
            sampled,
        }
    }
}

pub struct FormatDetector {
    sample_size: usize,
    min_match_ratio: f64,
}

impl FormatDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            sample_size: config.sample_size.max(1),
            min_match_ratio: config.min_match_ratio,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Pick the grammar matching the largest share of the sample.
    ///
    /// Only the first `sample_size` lines are looked at and blank lines are ignored.
    /// Ties go to the earlier format in [`LogFormat::DETECTABLE`]. A best ratio below the
    /// configured minimum, or an empty sample, yields `Unknown`.
    pub fn detect(&self, grammars: &GrammarSet, sample: &[&str]) -> Detection {
        let lines: Vec<&str> = sample
            .iter()
            .take(self.sample_size)
            .map(|line| line.trim_end())
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            debug!("empty detection sample");
            return Detection::unknown(0);
        }

        let mut best = Detection::unknown(lines.len());
        for grammar in grammars.detectable() {
            let matches = lines.iter().filter(|line| grammar.is_match(line)).count();
            let ratio = matches as f64 / lines.len() as f64;
            debug!(format = %grammar.format(), matches, ratio, "grammar vote");

            // strict comparison keeps the higher priority format on ties
            if ratio > best.ratio {
                best = Detection {
                    format: grammar.format(),
                    ratio,
                    sampled: lines.len(),
                };
            }
        }

        if best.ratio < self.min_match_ratio {
            debug!(ratio = best.ratio, "no grammar reached the match threshold");
            return Detection {
                format: LogFormat::Unknown,
                ..best
            };
        }

        best
    }
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}
