//! Run results and metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::enrichment::EnrichmentRecord;

/// One analyzed evidence item, in extraction order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// The (validated) IP address.
    pub ip_address: String,
    /// The raw timestamp text the extraction service associated with it.
    pub raw_timestamp_str: String,
    /// UTC instant of the timestamp, when it parsed.
    pub original_timestamp_utc: Option<DateTime<Utc>>,
    /// Immutable audit rendering, `YYYY-MM-DD HH:MM:SS UTC`, or `N/A`.
    pub original_timestamp_utc_str: String,
    /// Rendering in the requested target zone, or a display-error tag.
    pub converted_timestamp: String,
    /// Geolocation/ISP data (possibly an error record).
    pub ip_info: EnrichmentRecord,
}

/// Metadata describing one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Caller-supplied content hash of the input file (opaque here).
    pub input_file_hash: Option<String>,
    /// When the run started.
    pub start_time: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_seconds: f64,
    /// Resolved input path.
    pub input_filepath: String,
    /// The target timezone the caller requested.
    pub target_timezone: String,
    /// Caller-supplied version tag.
    pub app_version: Option<String>,
}

/// The full outcome of a successful run. `results` may be empty: a run
/// that found nothing is still a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Per-item results, in extraction order.
    pub results: Vec<AnalysisResult>,
    /// Run-level metadata.
    pub metadata: RunMetadata,
}
