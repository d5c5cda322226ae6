//! Defensive post-processing of the extraction service's text output.
//!
//! The service is instructed to answer with a bare JSON array, but models
//! wrap output in markdown fences or prose anyway. Everything here is pure:
//! text in, candidates (or a typed fatal error) out.

use std::collections::HashSet;

use log::{error, info, warn};
use serde_json::Value;

use crate::ip;

use super::types::{Candidate, ExtractionError};

/// Characters of context included around a JSON parse failure.
const DIAGNOSTIC_CONTEXT_CHARS: usize = 40;

/// Parses the service's raw text into cleaned, deduplicated candidates.
///
/// Fence-wrapping is tolerated; anything that does not reduce to a
/// `[` … `]` JSON array is a fatal extraction failure. Individual elements
/// with a bad shape or an invalid IP are dropped and logged, non-fatally.
/// An empty array is a valid result, not a failure.
pub fn parse_candidates(raw: &str) -> Result<Vec<Candidate>, ExtractionError> {
    let cleaned = strip_code_fences(raw.trim());

    if !(cleaned.starts_with('[') && cleaned.ends_with(']')) {
        error!("CRITICAL: no JSON array block found in the extraction response");
        error!("Full raw response:\n{}", raw);
        return Err(ExtractionError::NotJsonArray);
    }

    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| malformed_json(cleaned, &e))?;
    let Some(items) = value.as_array() else {
        error!("CRITICAL: parsed extraction JSON is not an array");
        return Err(ExtractionError::NotJsonArray);
    };

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut candidates = Vec::new();
    let mut dropped = 0usize;

    for item in items {
        let Some(object) = item.as_object() else {
            warn!("Skipping non-object extraction element: {:.100}", item.to_string());
            dropped += 1;
            continue;
        };
        let Some(ip_value) = object.get("ip_address") else {
            warn!("Skipping extraction element without ip_address");
            dropped += 1;
            continue;
        };
        let Some(ip_raw) = ip_value.as_str() else {
            warn!("Skipping element whose ip_address is not a string: {}", ip_value);
            dropped += 1;
            continue;
        };

        let timestamp_raw = match object.get("timestamp_str") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        // The comma-for-dot substitution is a recurring OCR/model artifact.
        let ip_address = ip_raw.trim().replace(',', ".");
        let timestamp_str = timestamp_raw.trim().to_string();

        if !ip::is_valid_ip(&ip_address) {
            warn!("Skipping invalid extracted IP {:?}", ip_raw);
            dropped += 1;
            continue;
        }

        if !seen.insert((ip_address.clone(), timestamp_str.clone())) {
            continue;
        }
        candidates.push(Candidate {
            ip_address,
            timestamp_str,
        });
    }

    if dropped > 0 {
        warn!("Dropped {} invalid extraction element(s)", dropped);
    }
    if candidates.is_empty() && !items.is_empty() {
        warn!("Extraction returned data, but nothing passed validation");
    } else if candidates.is_empty() {
        info!("Extraction found no IP/timestamp pairs");
    }

    Ok(candidates)
}

fn strip_code_fences(text: &str) -> &str {
    let mut out = text;
    if let Some(rest) = out.strip_prefix("```json") {
        out = rest;
    } else if let Some(rest) = out.strip_prefix("```") {
        out = rest;
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest;
    }
    out.trim()
}

fn malformed_json(text: &str, error: &serde_json::Error) -> ExtractionError {
    let snippet = snippet_around(text, error.line(), error.column());
    error!(
        "CRITICAL: extraction JSON parse error at line {}, column {}: {}",
        error.line(),
        error.column(),
        error
    );
    error!("Context: …{}…", snippet);
    ExtractionError::MalformedJson {
        line: error.line(),
        column: error.column(),
        snippet,
    }
}

/// Extracts the text surrounding a 1-based (line, column) position,
/// flattening newlines so the snippet stays a single log line.
fn snippet_around(text: &str, line: usize, column: usize) -> String {
    let offset: usize = text
        .lines()
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum::<usize>()
        + column.saturating_sub(1);

    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());
    let start = offset.saturating_sub(DIAGNOSTIC_CONTEXT_CHARS);
    let end = (offset + DIAGNOSTIC_CONTEXT_CHARS).min(chars.len());
    chars[start..end]
        .iter()
        .map(|c| if *c == '\n' { ' ' } else { *c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_array_parses() {
        let candidates = parse_candidates(
            r#"[{"ip_address": "8.8.8.8", "timestamp_str": "2024-03-15 10:30:00 UTC"}]"#,
        )
        .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ip_address, "8.8.8.8");
        assert_eq!(candidates[0].timestamp_str, "2024-03-15 10:30:00 UTC");
    }

    #[test]
    fn fenced_array_is_unwrapped() {
        let raw = "```json\n[{\"ip_address\": \"8.8.8.8\", \"timestamp_str\": \"\"}]\n```";
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn prose_wrapped_response_is_fatal() {
        let raw = "Here are the results: [{\"ip_address\": \"8.8.8.8\"}]";
        assert!(matches!(
            parse_candidates(raw),
            Err(ExtractionError::NotJsonArray)
        ));
    }

    #[test]
    fn malformed_json_reports_position() {
        let raw = r#"[{"ip_address": "8.8.8.8", "timestamp_str": }]"#;
        match parse_candidates(raw) {
            Err(ExtractionError::MalformedJson { line, column, snippet }) => {
                assert_eq!(line, 1);
                assert!(column > 0);
                assert!(snippet.contains("timestamp_str"));
            }
            other => panic!("expected MalformedJson, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn bad_shape_elements_dropped_non_fatally() {
        let raw = r#"[
            {"ip_address": "8.8.8.8", "timestamp_str": "ts"},
            {"timestamp_str": "no ip"},
            {"ip_address": 42, "timestamp_str": "numeric ip"},
            "just a string",
            {"ip_address": "not-an-ip", "timestamp_str": ""}
        ]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ip_address, "8.8.8.8");
    }

    #[test]
    fn comma_decimal_artifact_is_normalized() {
        let raw = r#"[{"ip_address": " 8,8,8,8 ", "timestamp_str": ""}]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates[0].ip_address, "8.8.8.8");
    }

    #[test]
    fn missing_or_null_timestamp_defaults_to_empty() {
        let raw = r#"[
            {"ip_address": "8.8.8.8"},
            {"ip_address": "9.9.9.9", "timestamp_str": null}
        ]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates[0].timestamp_str, "");
        assert_eq!(candidates[1].timestamp_str, "");
    }

    #[test]
    fn exact_duplicates_collapse_distinct_timestamps_survive() {
        let raw = r#"[
            {"ip_address": "8.8.8.8", "timestamp_str": "2024-03-15 10:30:00"},
            {"ip_address": "8.8.8.8", "timestamp_str": "2024-03-15 10:30:00"},
            {"ip_address": "8.8.8.8", "timestamp_str": "2024-03-16 11:00:00"}
        ]"#;
        let candidates = parse_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].timestamp_str, "2024-03-15 10:30:00");
        assert_eq!(candidates[1].timestamp_str, "2024-03-16 11:00:00");
    }

    #[test]
    fn first_occurrence_order_is_preserved() {
        let raw = r#"[
            {"ip_address": "9.9.9.9", "timestamp_str": ""},
            {"ip_address": "1.1.1.1", "timestamp_str": ""},
            {"ip_address": "9.9.9.9", "timestamp_str": ""},
            {"ip_address": "8.8.8.8", "timestamp_str": ""}
        ]"#;
        let candidates = parse_candidates(raw).unwrap();
        let ips: Vec<&str> = candidates.iter().map(|c| c.ip_address.as_str()).collect();
        assert_eq!(ips, ["9.9.9.9", "1.1.1.1", "8.8.8.8"]);
    }

    #[test]
    fn empty_array_is_a_valid_empty_result() {
        assert!(parse_candidates("[]").unwrap().is_empty());
    }
}
