//! Configuration types.
//!
//! This module defines the analysis configuration, credential container,
//! and the logging enums shared between the library and the CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_TARGET_TZ, ENRICHMENT_PACING_DELAY, GEMINI_KEY_ENV, IPINFO_TOKEN_ENV,
};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Credentials for the two external services.
///
/// Both must be present for a run to start; the pipeline fails fast
/// otherwise. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// API key for the extraction service.
    pub gemini_api_key: Option<String>,
    /// Token for the enrichment provider.
    pub ipinfo_token: Option<String>,
}

impl Credentials {
    /// Loads credentials from the process environment
    /// (`GEMINI_API_KEY` / `IPINFO_TOKEN`).
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Credentials {
            gemini_api_key: read(GEMINI_KEY_ENV),
            ipinfo_token: read(IPINFO_TOKEN_ENV),
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Evidence file to analyze.
    pub input_file: PathBuf,

    /// Target timezone for converted timestamps: `"UTC"`, an IANA name,
    /// or a POSIX-inverted `Etc/GMT±N` fixed offset.
    pub target_timezone: String,

    /// Caller-supplied content hash of the input file, recorded verbatim
    /// in the run metadata. Opaque to the pipeline.
    pub input_file_hash: Option<String>,

    /// Caller-supplied version tag recorded in the run metadata.
    pub app_version: Option<String>,

    /// Pause between successive enrichment network calls.
    pub pacing_delay: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::new(),
            target_timezone: DEFAULT_TARGET_TZ.to_string(),
            input_file_hash: None,
            app_version: None,
            pacing_delay: ENRICHMENT_PACING_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn default_config_targets_utc() {
        let config = AnalysisConfig::default();
        assert_eq!(config.target_timezone, "UTC");
        assert_eq!(config.pacing_delay, ENRICHMENT_PACING_DELAY);
        assert!(config.input_file_hash.is_none());
    }
}
