//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ip_analyzer` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Input-file hashing for the evidence trail
//! - User-facing output and JSON report export
//!
//! All core functionality is implemented in the library crate.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use ip_analyzer::config::DEFAULT_TARGET_TZ;
use ip_analyzer::initialization::init_logger_with;
use ip_analyzer::input::PlainTextReader;
use ip_analyzer::pipeline::progress::LogProgress;
use ip_analyzer::{AnalysisConfig, AnalysisReport, Credentials, LogFormat, LogLevel, Pipeline};

/// Extract IPs and timestamps from a text file, enrich them with
/// geolocation/ISP data, and produce a report.
#[derive(Parser, Debug)]
#[command(name = "ip_analyzer", version)]
struct Opt {
    /// Input evidence file (plain text or log)
    input_file: PathBuf,

    /// Target timezone for converted timestamps: "UTC", an IANA name
    /// (e.g. America/Bogota), or a POSIX fixed offset (Etc/GMT+5 = UTC-5)
    #[arg(short = 't', long = "timezone", default_value = DEFAULT_TARGET_TZ)]
    timezone: String,

    /// Base path for the JSON report; "<output>.json" is written
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env (credentials live there).
    // Try the current directory first, then next to the executable.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let credentials = Credentials::from_env();

    // Hash the evidence file up front; the pipeline records the hash
    // verbatim in the run metadata. Missing files fail validation inside
    // the pipeline, so a hash failure here is not fatal yet.
    let input_file_hash = hash_file(&opt.input_file).ok();

    let config = AnalysisConfig {
        input_file: opt.input_file.clone(),
        target_timezone: opt.timezone.clone(),
        input_file_hash,
        app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        ..Default::default()
    };

    let pipeline = Pipeline::new(config, credentials).context("Failed to initialize pipeline")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Ctrl-C received; cancelling analysis");
                cancel.cancel();
            }
        });
    }

    match pipeline.run(&PlainTextReader, &LogProgress, &cancel).await {
        Ok(report) => {
            print_summary(&report);
            if let Some(base) = opt.output {
                let path = base.with_extension("json");
                export_json(&report, &path)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                println!("Report saved to {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("ip_analyzer error: {e}");
            process::exit(1);
        }
    }
}

fn print_summary(report: &AnalysisReport) {
    println!(
        "Processed {} IP{} in {:.1}s (timezone: {})",
        report.results.len(),
        if report.results.len() == 1 { "" } else { "s" },
        report.metadata.duration_seconds,
        report.metadata.target_timezone
    );
    for result in &report.results {
        let note = match &result.ip_info.error {
            Some(error) => format!(" [{}]", error),
            None => String::new(),
        };
        println!(
            "  {:<40} {:<28} {} ({}, {}){}",
            result.ip_address,
            result.converted_timestamp,
            result.ip_info.isp,
            result.ip_info.city,
            result.ip_info.country,
            note
        );
    }
}

fn export_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn hash_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
