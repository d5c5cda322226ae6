//! Enrichment provider client.
//!
//! A thin reqwest wrapper around the provider's `GET {base}/{ip}/json`
//! endpoint with a bounded timeout and typed failure classification.

use std::sync::OnceLock;

use log::{debug, error};
use regex::Regex;

use crate::config::{ENRICHMENT_TIMEOUT, IPINFO_BASE_URL};

use super::types::{EnrichmentRecord, IpInfoResponse, LookupError, FIELD_UNAVAILABLE};

/// HTTP client for the geolocation/ISP provider.
#[derive(Debug, Clone)]
pub struct IpInfoClient {
    http: reqwest::Client,
    base_url: String,
}

impl IpInfoClient {
    /// Builds a client against the production provider endpoint.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_url(IPINFO_BASE_URL)
    }

    /// Builds a client against an alternative endpoint (mock servers in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(ENRICHMENT_TIMEOUT)
            .build()?;
        Ok(IpInfoClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Looks up one IP address with the given token.
    ///
    /// The caller is responsible for cache consultation, scope fast-paths,
    /// and pacing; this method always performs exactly one HTTP request.
    pub async fn lookup(&self, ip: &str, token: &str) -> Result<EnrichmentRecord, LookupError> {
        let url = format!("{}/{}/json?token={}", self.base_url, ip, token);
        debug!("Querying enrichment provider for {}", ip);

        let response = self.http.get(&url).send().await.map_err(|e| {
            let kind = LookupError::from_reqwest(&e);
            error!("Enrichment request for {} failed: {}", ip, e);
            kind
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "Enrichment provider returned HTTP {} for {}",
                status.as_u16(),
                ip
            );
            return Err(LookupError::from_status(status.as_u16()));
        }

        let body: IpInfoResponse = response.json().await.map_err(|e| {
            error!("Enrichment response for {} was not valid JSON: {}", ip, e);
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::MalformedBody
            }
        })?;

        Ok(record_from_response(body))
    }

    /// Lightweight credential probe: one lookup of a well-known address.
    ///
    /// Used by frontends to confirm a token before starting a run; the
    /// pipeline itself never calls this.
    pub async fn probe(&self, token: &str) -> bool {
        self.lookup("8.8.8.8", token).await.is_ok()
    }
}

fn record_from_response(response: IpInfoResponse) -> EnrichmentRecord {
    EnrichmentRecord {
        isp: parse_org(response.org.as_deref(), response.isp.as_deref()),
        city: field_or_unavailable(response.city),
        region: field_or_unavailable(response.region),
        country: field_or_unavailable(response.country),
        hostname: field_or_unavailable(response.hostname),
        error: None,
    }
}

fn field_or_unavailable(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => FIELD_UNAVAILABLE.to_string(),
    }
}

/// Extracts the organization name from the provider's `org` field.
///
/// The field usually carries a leading autonomous-system token
/// (`AS15169 Google LLC`); the token is stripped and only the name kept.
/// An org without the token is kept verbatim; an absent/empty org falls
/// back to the separate `isp` field.
pub(crate) fn parse_org(org: Option<&str>, isp: Option<&str>) -> String {
    static AS_PREFIX: OnceLock<Regex> = OnceLock::new();
    let as_prefix =
        AS_PREFIX.get_or_init(|| Regex::new(r"(?i)^AS\d+\s+(.*)$").expect("static pattern"));

    if let Some(org) = org.map(str::trim).filter(|o| !o.is_empty()) {
        let name = match as_prefix.captures(org) {
            Some(captures) => captures[1].trim().to_string(),
            None => org.to_string(),
        };
        if !name.is_empty() && name != FIELD_UNAVAILABLE {
            return name;
        }
    }
    match isp.map(str::trim).filter(|i| !i.is_empty()) {
        Some(isp) => isp.to_string(),
        None => FIELD_UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[test]
    fn org_with_as_token_is_stripped() {
        assert_eq!(parse_org(Some("AS15169 Google LLC"), None), "Google LLC");
        assert_eq!(parse_org(Some("as8075  Microsoft"), None), "Microsoft");
    }

    #[test]
    fn org_without_token_kept_verbatim() {
        assert_eq!(parse_org(Some("Cloudflare, Inc."), None), "Cloudflare, Inc.");
    }

    #[test]
    fn absent_org_falls_back_to_isp() {
        assert_eq!(parse_org(None, Some("Some ISP")), "Some ISP");
        assert_eq!(parse_org(Some("  "), Some("Some ISP")), "Some ISP");
        assert_eq!(parse_org(None, None), "N/A");
    }

    #[tokio::test]
    async fn successful_lookup_maps_fields() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/8.8.8.8/json")).respond_with(
                json_encoded(serde_json::json!({
                    "org": "AS15169 Google LLC",
                    "city": "Mountain View",
                    "region": "California",
                    "country": "US",
                    "hostname": "dns.google"
                })),
            ),
        );

        let client = IpInfoClient::with_base_url(server.url_str("/")).unwrap();
        let record = client.lookup("8.8.8.8", "token").await.unwrap();
        assert_eq!(record.isp, "Google LLC");
        assert_eq!(record.city, "Mountain View");
        assert_eq!(record.country, "US");
        assert_eq!(record.error, None);
    }

    #[tokio::test]
    async fn missing_fields_default_to_unavailable() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/1.1.1.1/json"))
                .respond_with(json_encoded(serde_json::json!({"org": "Cloudflare"}))),
        );

        let client = IpInfoClient::with_base_url(server.url_str("/")).unwrap();
        let record = client.lookup("1.1.1.1", "token").await.unwrap();
        assert_eq!(record.isp, "Cloudflare");
        assert_eq!(record.city, "N/A");
        assert_eq!(record.hostname, "N/A");
    }

    #[tokio::test]
    async fn http_statuses_classify() {
        let cases = [
            (401, LookupError::Unauthorized),
            (404, LookupError::NotFound),
            (429, LookupError::RateLimited),
            (503, LookupError::Http(503)),
        ];
        for (status, expected) in cases {
            let server = Server::run();
            server.expect(
                Expectation::matching(request::method_path("GET", "/9.9.9.9/json"))
                    .respond_with(status_code(status)),
            );
            let client = IpInfoClient::with_base_url(server.url_str("/")).unwrap();
            let error = client.lookup("9.9.9.9", "token").await.unwrap_err();
            assert_eq!(error, expected, "status {}", status);
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/9.9.9.9/json"))
                .respond_with(status_code(200).body("not json at all")),
        );
        let client = IpInfoClient::with_base_url(server.url_str("/")).unwrap();
        let error = client.lookup("9.9.9.9", "token").await.unwrap_err();
        assert_eq!(error, LookupError::MalformedBody);
    }
}
