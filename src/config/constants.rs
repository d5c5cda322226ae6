//! Configuration constants.
//!
//! Timeouts, service endpoints, pacing, and the progress-percentage
//! allocation used by the pipeline.

use std::time::Duration;

/// Enrichment provider base URL; lookups go to `{base}/{ip}/json?token={token}`.
pub const IPINFO_BASE_URL: &str = "https://ipinfo.io";

/// Extraction service base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Extraction model identifier.
pub const GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Extraction request timeout.
/// The whole source document travels in one prompt, so responses can be slow.
pub const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-IP enrichment request timeout.
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause between successive enrichment network calls.
/// Respects the provider's rate limits; cache hits and scope-classified
/// addresses never pay it since they make no network call.
pub const ENRICHMENT_PACING_DELAY: Duration = Duration::from_millis(100);

/// Default target timezone for converted timestamps.
pub const DEFAULT_TARGET_TZ: &str = "UTC";

/// Environment variable holding the extraction service API key.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the enrichment provider token.
pub const IPINFO_TOKEN_ENV: &str = "IPINFO_TOKEN";

// Progress percentage allocation: 0-15 setup/read, 15-30 extraction,
// 30-100 spread across candidate processing.
/// Progress reported once the input file is being read.
pub const PROGRESS_READ: u8 = 5;
/// Progress reported when the extraction request is sent.
pub const PROGRESS_EXTRACTION_START: u8 = 15;
/// Progress reported when candidate processing begins.
pub const PROGRESS_PROCESSING_START: u8 = 30;
/// Share of the progress bar spread across candidate processing.
pub const PROGRESS_PROCESSING_SPAN: u8 = 70;
