//! Extraction data structures and service wire types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One raw (IP, timestamp-text) pair extracted from the source text.
///
/// Produced only by the extraction adapter, already cleaned, validated,
/// and deduplicated by exact (ip_address, timestamp_str) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    /// Syntactically valid IPv4/IPv6 address.
    pub ip_address: String,
    /// The original date/time text near the IP; empty when none was found.
    pub timestamp_str: String,
}

/// Run-fatal extraction failures.
///
/// Every variant aborts the run; per-element problems inside an otherwise
/// valid response are dropped and logged instead.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The service did not answer within the extraction timeout.
    #[error("extraction request timed out")]
    Timeout,

    /// The service could not be reached.
    #[error("could not reach the extraction service: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("extraction service returned HTTP {0}")]
    Http(u16),

    /// The service envelope itself could not be decoded.
    #[error("could not decode the extraction service response")]
    BadEnvelope,

    /// The safety/content filter blocked the response.
    #[error("extraction blocked by content filter: {0}")]
    Blocked(String),

    /// The service answered but produced no text.
    #[error("extraction service returned no text")]
    EmptyResponse,

    /// The returned text is not bracketed as a JSON array.
    #[error("response does not contain a JSON array")]
    NotJsonArray,

    /// The returned text is bracketed but not parseable JSON.
    #[error("malformed JSON at line {line}, column {column}: …{snippet}…")]
    MalformedJson {
        /// 1-based line of the parse failure.
        line: usize,
        /// 1-based column of the parse failure.
        column: usize,
        /// Text surrounding the failure position, newlines flattened.
        snippet: String,
    },
}

// ---- Gemini generateContent wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<RequestContent>,
    pub(crate) safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub(crate) fn for_prompt(prompt: String) -> Self {
        // The source text is forensic evidence (attack logs, abuse reports);
        // default safety thresholds routinely reject it.
        let permissive = |category: &'static str| SafetySetting {
            category,
            threshold: "BLOCK_NONE",
        };
        GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            safety_settings: vec![
                permissive("HARM_CATEGORY_HARASSMENT"),
                permissive("HARM_CATEGORY_HATE_SPEECH"),
                permissive("HARM_CATEGORY_SEXUALLY_EXPLICIT"),
                permissive("HARM_CATEGORY_DANGEROUS_CONTENT"),
            ],
            generation_config: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestContent {
    pub(crate) parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestPart {
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SafetySetting {
    pub(crate) category: &'static str,
    pub(crate) threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<ResponseCandidate>,
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub(crate) fn joined_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseCandidate {
    pub(crate) content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub(crate) block_reason: Option<String>,
    #[serde(default)]
    pub(crate) safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SafetyRating {
    pub(crate) category: Option<String>,
    pub(crate) probability: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_text_concatenates_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{\"a\""}, {"text": ": 1}]"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response.joined_text(), "[{\"a\": 1}]");
    }

    #[test]
    fn empty_candidates_yield_empty_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}))
                .unwrap();
        assert_eq!(response.joined_text(), "");
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
