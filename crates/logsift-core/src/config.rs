//! Engine configuration: detection sampling, severity inference words, timestamp defaults

use crate::error::SiftError;
use crate::Severity;
use serde::Deserialize;
use std::fs;
use std::path::Path;

// Main config structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub timestamps: TimestampConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    // number of leading lines handed to the detector
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    // share of non-blank sampled lines a grammar must match
    #[serde(default = "default_min_match_ratio")]
    pub min_match_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            min_match_ratio: default_min_match_ratio(),
        }
    }
}

/// Words used to guess a severity from message text when the line carries no usable level.
/// Checked from the most to the least severe list, substring match, case-insensitive.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_critical_words")]
    pub critical: Vec<String>,

    #[serde(default = "default_error_words")]
    pub error: Vec<String>,

    #[serde(default = "default_warning_words")]
    pub warning: Vec<String>,

    #[serde(default)]
    pub info: Vec<String>,

    #[serde(default)]
    pub debug: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            critical: default_critical_words(),
            error: default_error_words(),
            warning: default_warning_words(),
            info: Vec::new(),
            debug: Vec::new(),
        }
    }
}

impl InferenceConfig {
    /// Word lists in the order they are consulted
    pub fn rules(&self) -> [(Severity, &[String]); 5] {
        [
            (Severity::Critical, self.critical.as_slice()),
            (Severity::Error, self.error.as_slice()),
            (Severity::Warning, self.warning.as_slice()),
            (Severity::Info, self.info.as_slice()),
            (Severity::Debug, self.debug.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimestampConfig {
    // syslog lines carry no year; None means the current UTC year
    #[serde(default)]
    pub syslog_year: Option<i32>,
}

fn default_sample_size() -> usize {
    20
}

fn default_min_match_ratio() -> f64 {
    0.6
}

fn default_critical_words() -> Vec<String> {
    vec!["critical".to_string(), "fatal".to_string()]
}

fn default_error_words() -> Vec<String> {
    vec!["error".to_string(), "fail".to_string()]
}

fn default_warning_words() -> Vec<String> {
    vec!["warn".to_string()]
}

// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, SiftError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SiftError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: EngineConfig = toml::from_str(&content).map_err(|e| SiftError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if config.detection.sample_size == 0 {
        return Err(SiftError::Config {
            path: path.to_path_buf(),
            message: "detection.sample_size must be at least 1".to_string(),
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[detection]
sample_size = 10
min_match_ratio = 0.75

[inference]
critical = ["panic"]
error = ["error", "denied"]
warning = ["warn", "slow"]
debug = ["trace"]

[timestamps]
syslog_year = 2024
"#;
        let config: EngineConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.detection.sample_size, 10);
        assert_eq!(config.detection.min_match_ratio, 0.75);
        assert_eq!(config.inference.critical, vec!["panic"]);
        assert_eq!(config.inference.debug, vec!["trace"]);
        assert!(config.inference.info.is_empty());
        assert_eq!(config.timestamps.syslog_year, Some(2024));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EngineConfig = toml::from_str("[detection]\nsample_size = 5\n").unwrap();
        assert_eq!(config.detection.sample_size, 5);
        assert_eq!(config.detection.min_match_ratio, 0.6);
        assert_eq!(config.inference.error, vec!["error", "fail"]);
        assert_eq!(config.timestamps.syslog_year, None);
    }

    #[test]
    fn test_empty_config() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.detection.sample_size, 20);
        assert_eq!(config.inference.warning, vec!["warn"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, SiftError::Config { .. }));
    }
}
