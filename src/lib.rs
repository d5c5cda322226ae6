//! ip_analyzer library: forensic IP/timestamp analysis pipeline.
//!
//! This library extracts IP addresses and their associated timestamps from
//! free-form text (chat logs, server logs, documents) using an AI extraction
//! service, enriches each IP with geolocation/ISP data, normalizes every
//! timestamp to UTC plus a requested target timezone, and returns an
//! ordered, structured report.
//!
//! # Example
//!
//! ```no_run
//! use ip_analyzer::{AnalysisConfig, Credentials, Pipeline};
//! use ip_analyzer::input::PlainTextReader;
//! use ip_analyzer::pipeline::progress::LogProgress;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig {
//!     input_file: "evidence.txt".into(),
//!     target_timezone: "America/Bogota".to_string(),
//!     ..Default::default()
//! };
//! let pipeline = Pipeline::new(config, Credentials::from_env())?;
//! let report = pipeline
//!     .run(&PlainTextReader, &LogProgress, &CancellationToken::new())
//!     .await?;
//! println!("{} IPs analyzed", report.results.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod config;
pub mod enrichment;
pub mod extraction;
pub mod initialization;
pub mod input;
pub mod ip;
pub mod pipeline;
pub mod timestamp;

// Re-export public API
pub use config::{AnalysisConfig, Credentials, LogFormat, LogLevel};
pub use enrichment::{EnrichmentRecord, LookupError};
pub use extraction::Candidate;
pub use pipeline::{AnalysisReport, AnalysisResult, FatalError, Pipeline, RunMetadata};
