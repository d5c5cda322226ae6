//! Extraction service client.
//!
//! Sends the full source text to the Gemini `generateContent` endpoint and
//! reduces the answer to validated candidates. Every failure here is
//! run-fatal; the pipeline has nothing to work with without extraction.

use log::{debug, error, info};

use crate::config::{EXTRACTION_TIMEOUT, GEMINI_BASE_URL, GEMINI_MODEL};

use super::payload;
use super::types::{
    Candidate, ExtractionError, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

const PROMPT_RULES: &str = r#"Analyze the following text and extract every valid IPv4 or IPv6 address together with the most relevant nearby date/time string associated with it.

Strict response rules:
1. Respond ONLY with a valid JSON array.
2. The response MUST start with `[` and end with `]`.
3. Do NOT include ANY text before `[` or after `]`, not even formatting markers such as ```json.
4. Every JSON object in the array must have exactly two keys:
   - "ip_address": string (the valid IP address found).
   - "timestamp_str": string (the original date/time text associated with it; use an empty string "" when no timestamp appears near the IP).
5. Ignore private-range addresses (e.g. 192.168.x.x, 10.x.x.x, 172.16-31.x.x, fe80::) unless the context strongly suggests they are relevant.
6. If an IP appears several times with the same nearby timestamp, include it only once. If it appears with different timestamps, include each unique pair.
7. Internally verify that the extracted IPs are syntactically correct.

Example of a PERFECT response:
[
  {"ip_address": "203.0.113.45", "timestamp_str": "2024-03-15 10:30:00 UTC"},
  {"ip_address": "8.8.4.4", "timestamp_str": "Mar 15 2024 08:15:22 -0500"},
  {"ip_address": "198.51.100.10", "timestamp_str": ""},
  {"ip_address": "2001:db8:abcd:0012::1", "timestamp_str": "2024/03/14 15:45:30.123"}
]

Text to analyze:
--------------------
"#;

/// HTTP client for the text-understanding extraction service.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Builds a client against the production service endpoint.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_url(GEMINI_BASE_URL)
    }

    /// Builds a client against an alternative endpoint (mock servers in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(EXTRACTION_TIMEOUT)
            .build()?;
        Ok(GeminiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        })
    }

    /// Extracts (IP, raw-timestamp) candidates from `text`.
    ///
    /// Returns `Ok(vec![])` when the service ran correctly and found
    /// nothing; every `Err` is run-fatal.
    pub async fn extract(
        &self,
        text: &str,
        api_key: &str,
    ) -> Result<Vec<Candidate>, ExtractionError> {
        info!(
            "Sending extraction request ({} source characters); this can take a while",
            text.len()
        );
        let request = GenerateContentRequest::for_prompt(build_prompt(text));
        let body = self.generate(&request, api_key).await?;

        let raw_text = body.joined_text();
        if raw_text.is_empty() {
            if let Some(feedback) = &body.prompt_feedback {
                if let Some(reason) = &feedback.block_reason {
                    error!("CRITICAL: extraction response blocked, reason: {}", reason);
                    for rating in &feedback.safety_ratings {
                        error!(
                            " - {}: {}",
                            rating.category.as_deref().unwrap_or("?"),
                            rating.probability.as_deref().unwrap_or("?")
                        );
                    }
                    return Err(ExtractionError::Blocked(reason.clone()));
                }
            }
            error!("CRITICAL: extraction response was empty or carried no text");
            return Err(ExtractionError::EmptyResponse);
        }

        debug!(
            "Raw extraction response received ({} characters)",
            raw_text.len()
        );
        let candidates = payload::parse_candidates(&raw_text)?;
        info!("Extraction completed: {} valid candidate(s)", candidates.len());
        Ok(candidates)
    }

    /// Lightweight credential probe: a one-token generation request.
    ///
    /// Used by frontends to confirm a key before starting a run; the
    /// pipeline itself never calls this.
    pub async fn probe(&self, api_key: &str) -> bool {
        let mut request = GenerateContentRequest::for_prompt("test".to_string());
        request.generation_config = Some(GenerationConfig {
            max_output_tokens: 1,
        });
        self.generate(&request, api_key).await.is_ok()
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
        api_key: &str,
    ) -> Result<GenerateContentResponse, ExtractionError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self.http.post(&url).json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                error!("CRITICAL: timeout waiting for the extraction service");
                ExtractionError::Timeout
            } else {
                error!("CRITICAL: could not reach the extraction service: {}", e);
                ExtractionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "CRITICAL: extraction service returned HTTP {}",
                status.as_u16()
            );
            return Err(ExtractionError::Http(status.as_u16()));
        }

        response.json().await.map_err(|e| {
            error!("CRITICAL: undecodable extraction service response: {}", e);
            if e.is_timeout() {
                ExtractionError::Timeout
            } else {
                ExtractionError::BadEnvelope
            }
        })
    }
}

fn build_prompt(text: &str) -> String {
    format!("{}{}\n--------------------\n", PROMPT_RULES, text)
}
