//! Application configuration and constants.

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{AnalysisConfig, Credentials, LogFormat, LogLevel};
