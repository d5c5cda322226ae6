//! Pipeline orchestration.
//!
//! One [`Pipeline::run`] call drives a full analysis:
//! `Validating → Reading → Extracting → EnrichingAndNormalizing →
//! Completed | Failed`. Only the first three phases can fail the run;
//! per-candidate enrichment and timestamp problems are recorded inline in
//! the result and never abort the batch.
//!
//! Candidates are processed strictly in extraction order. That order
//! mirrors where the evidence appeared in the source document and is part
//! of the output contract, so the loop is sequential on purpose.

pub mod progress;
mod report;

pub use report::{AnalysisReport, AnalysisResult, RunMetadata};

use chrono::Utc;
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{
    AnalysisConfig, Credentials, PROGRESS_EXTRACTION_START, PROGRESS_PROCESSING_SPAN,
    PROGRESS_PROCESSING_START, PROGRESS_READ,
};
use crate::enrichment::{Enricher, IpInfoClient};
use crate::extraction::{ExtractionError, GeminiClient};
use crate::initialization::InitializationError;
use crate::input::TextReader;
use crate::timestamp;

use progress::{ProgressReporter, ProgressSink};

/// Phases of one analysis run, used for progress labels and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Run object created, nothing checked yet.
    Init,
    /// Credential and input-file checks.
    Validating,
    /// Reading the source text.
    Reading,
    /// Calling the extraction service.
    Extracting,
    /// Per-candidate enrichment and timestamp normalization.
    EnrichingAndNormalizing,
    /// Terminal success state (results may be empty).
    Completed,
    /// Terminal failure state.
    Failed,
}

impl RunPhase {
    /// Progress-facing label for this phase.
    pub fn label(&self) -> &'static str {
        match self {
            RunPhase::Init => "Init",
            RunPhase::Validating => "Validating",
            RunPhase::Reading => "Reading",
            RunPhase::Extracting => "AI extraction",
            RunPhase::EnrichingAndNormalizing => "Processing IPs",
            RunPhase::Completed => "Completed",
            RunPhase::Failed => "Error",
        }
    }
}

/// Failures that abort the whole run.
///
/// Nothing partial is surfaced alongside these; a caller receiving one of
/// them gets an explicit "analysis failed" state, distinct from a completed
/// run with zero results.
#[derive(Error, Debug)]
pub enum FatalError {
    /// A required credential is absent.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// The input file does not exist.
    #[error("input file not found: {0}")]
    InputFileMissing(String),

    /// The input file could not be read.
    #[error("failed to read input: {0}")]
    Read(String),

    /// The extraction service call failed.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The run was cancelled cooperatively.
    #[error("analysis cancelled")]
    Cancelled,
}

/// Drives one analysis run at a time.
///
/// The pipeline itself is reusable across runs; all per-run state (the
/// enrichment cache in particular) is constructed fresh inside [`run`].
///
/// [`run`]: Pipeline::run
pub struct Pipeline {
    config: AnalysisConfig,
    credentials: Credentials,
    extraction: GeminiClient,
    enrichment: IpInfoClient,
}

impl Pipeline {
    /// Builds a pipeline against the production service endpoints.
    pub fn new(
        config: AnalysisConfig,
        credentials: Credentials,
    ) -> Result<Self, InitializationError> {
        let extraction = GeminiClient::new()?;
        let enrichment = IpInfoClient::new()?;
        Ok(Self::with_clients(config, credentials, extraction, enrichment))
    }

    /// Builds a pipeline with caller-supplied clients (mock servers in tests).
    pub fn with_clients(
        config: AnalysisConfig,
        credentials: Credentials,
        extraction: GeminiClient,
        enrichment: IpInfoClient,
    ) -> Self {
        Pipeline {
            config,
            credentials,
            extraction,
            enrichment,
        }
    }

    /// Runs one full analysis.
    ///
    /// Returns the report (possibly with empty results) or the fatal error
    /// that aborted the run. Progress flows through `progress` as the run
    /// advances; `cancel` is checked at every per-candidate boundary.
    pub async fn run(
        &self,
        reader: &dyn TextReader,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, FatalError> {
        let start_time = Utc::now();
        let started = std::time::Instant::now();

        info!("=== Analysis started ===");
        info!("Input file: {}", self.config.input_file.display());
        info!("Requested timezone: {:?}", self.config.target_timezone);
        if let Some(hash) = &self.config.input_file_hash {
            info!("Input file hash: {}", hash);
        }

        let mut reporter = ProgressReporter::new(progress);
        reporter.report(RunPhase::Validating.label(), 0, "Validating configuration...");

        let outcome = self.execute(reader, &mut reporter, cancel).await;
        let duration_seconds = started.elapsed().as_secs_f64();

        let results = match outcome {
            Ok(results) => {
                info!(
                    "=== Analysis finished: {} item(s) in {:.2}s ===",
                    results.len(),
                    duration_seconds
                );
                results
            }
            Err(fatal) => {
                error!("CRITICAL: analysis failed after {:.2}s: {}", duration_seconds, fatal);
                reporter.report(RunPhase::Failed.label(), 100, fatal.to_string());
                return Err(fatal);
            }
        };

        reporter.report(
            RunPhase::Completed.label(),
            100,
            format!("Analysis finished ({} IPs)", results.len()),
        );

        Ok(AnalysisReport {
            results,
            metadata: RunMetadata {
                input_file_hash: self.config.input_file_hash.clone(),
                start_time,
                duration_seconds,
                input_filepath: self.config.input_file.display().to_string(),
                target_timezone: self.config.target_timezone.clone(),
                app_version: self.config.app_version.clone(),
            },
        })
    }

    async fn execute(
        &self,
        reader: &dyn TextReader,
        reporter: &mut ProgressReporter<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<AnalysisResult>, FatalError> {
        // Validating: fail fast, before any file or network access.
        let gemini_key = require_credential(self.credentials.gemini_api_key.as_deref(), "GEMINI_API_KEY")?;
        let ipinfo_token = require_credential(self.credentials.ipinfo_token.as_deref(), "IPINFO_TOKEN")?;
        if !self.config.input_file.is_file() {
            let path = self.config.input_file.display().to_string();
            error!("CRITICAL: input file not found: {}", path);
            return Err(FatalError::InputFileMissing(path));
        }

        // Reading
        reporter.report(
            RunPhase::Reading.label(),
            PROGRESS_READ,
            format!("Reading {}...", self.config.input_file.display()),
        );
        let text = reader.read_text(&self.config.input_file).map_err(|e| {
            error!("CRITICAL: failed to read input: {:#}", e);
            FatalError::Read(format!("{:#}", e))
        })?;
        if text.trim().is_empty() {
            reporter.report(RunPhase::Completed.label(), 100, "Empty input file");
            return Ok(Vec::new());
        }
        info!("Input read ({} characters)", text.len());

        // Extracting
        reporter.report(
            RunPhase::Extracting.label(),
            PROGRESS_EXTRACTION_START,
            "Sending text to the extraction service...",
        );
        let candidates = self.extraction.extract(&text, gemini_key).await?;
        if candidates.is_empty() {
            reporter.report(RunPhase::Completed.label(), 100, "No IPs extracted");
            return Ok(Vec::new());
        }

        // EnrichingAndNormalizing
        let total = candidates.len();
        reporter.report(
            RunPhase::EnrichingAndNormalizing.label(),
            PROGRESS_PROCESSING_START,
            format!("Processing {} IPs...", total),
        );

        let mut enricher = Enricher::new(
            self.enrichment.clone(),
            Some(ipinfo_token.to_string()),
            self.config.pacing_delay,
        );
        let mut results = Vec::with_capacity(total);

        for (idx, candidate) in candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Cancellation requested; stopping before candidate {}/{}", idx + 1, total);
                return Err(FatalError::Cancelled);
            }

            let share = ((idx + 1) * PROGRESS_PROCESSING_SPAN as usize / total) as u8;
            reporter.report(
                RunPhase::EnrichingAndNormalizing.label(),
                PROGRESS_PROCESSING_START + share,
                format!("IP {}/{}: {}", idx + 1, total, candidate.ip_address),
            );
            debug!(
                "Processing candidate {}/{}: {} (raw ts {:?})",
                idx + 1,
                total,
                candidate.ip_address,
                candidate.timestamp_str
            );

            let ip_info = enricher.lookup(&candidate.ip_address).await;
            if let Some(error) = &ip_info.error {
                warn!("Enrichment note for {}: {}", candidate.ip_address, error);
            }

            let normalized =
                timestamp::normalize(&candidate.timestamp_str, &self.config.target_timezone);
            if normalized.instant.is_none() && !candidate.timestamp_str.is_empty() {
                warn!(
                    "Timestamp issue for {}: raw={:?}, rendered={:?}",
                    candidate.ip_address, candidate.timestamp_str, normalized.converted_str
                );
            }

            results.push(AnalysisResult {
                ip_address: candidate.ip_address,
                raw_timestamp_str: candidate.timestamp_str,
                original_timestamp_utc: normalized.instant,
                original_timestamp_utc_str: normalized.utc_str,
                converted_timestamp: normalized.converted_str,
                ip_info,
            });
        }

        Ok(results)
    }
}

fn require_credential<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, FatalError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Ok(value),
        None => {
            error!("CRITICAL: credential {} is not configured", name);
            Err(FatalError::MissingCredential(name))
        }
    }
}
