//! Startup initialization: logger setup.
//!
//! HTTP clients construct themselves (`GeminiClient::new`,
//! `IpInfoClient::new`); this module owns the pieces that must happen once
//! per process.

mod logger;

pub use logger::init_logger_with;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
