//! Per-run enrichment memoization.
//!
//! The [`Enricher`] owns everything one run needs to resolve IPs: the
//! provider client, the token, the cache, the once-per-run missing-token
//! warning flag, and the pacing state. Construct a fresh one per run; the
//! cache must never be shared across concurrent runs.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::ip;

use super::client::IpInfoClient;
use super::types::{EnrichmentRecord, LookupError};

/// Resolves IPs to [`EnrichmentRecord`]s, one provider call per unique IP
/// per run.
pub struct Enricher {
    client: IpInfoClient,
    token: Option<String>,
    pacing_delay: Duration,
    cache: HashMap<String, EnrichmentRecord>,
    token_warning_logged: bool,
    network_called: bool,
}

impl Enricher {
    /// Creates a fresh enricher for one run.
    pub fn new(client: IpInfoClient, token: Option<String>, pacing_delay: Duration) -> Self {
        Enricher {
            client,
            token,
            pacing_delay,
            cache: HashMap::new(),
            token_warning_logged: false,
            network_called: false,
        }
    }

    /// Resolves one IP address.
    ///
    /// Resolution order: cache hit, syntactic validation, scope fast-path,
    /// token check, provider lookup. Scope fast-path and provider results
    /// (including provider errors) are cached; invalid-format and
    /// missing-token records are not, so they carry no stale state if the
    /// condition is fixed mid-run.
    pub async fn lookup(&mut self, ip: &str) -> EnrichmentRecord {
        if let Some(record) = self.cache.get(ip) {
            debug!("Cache hit for {}", ip);
            return record.clone();
        }
        debug!("Cache miss for {}", ip);

        if !ip::is_valid_ip(ip) {
            // Upstream validation should make this unreachable in practice.
            error!("Refusing to look up syntactically invalid IP {:?}", ip);
            return EnrichmentRecord::unavailable(LookupError::InvalidFormat);
        }

        if let Some(kind) = ip::classify_str(ip) {
            info!("{} is scope-classified ({}); skipping provider lookup", ip, kind);
            let record = EnrichmentRecord::scoped(kind);
            self.cache.insert(ip.to_string(), record.clone());
            return record;
        }

        let token = match self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(token) => token.to_string(),
            None => {
                if !self.token_warning_logged {
                    error!("CRITICAL: enrichment provider token is not configured");
                    self.token_warning_logged = true;
                }
                return EnrichmentRecord::unavailable(LookupError::MissingToken);
            }
        };

        // Pace only real provider calls, and only after a previous one.
        if self.network_called && !self.pacing_delay.is_zero() {
            tokio::time::sleep(self.pacing_delay).await;
        }
        self.network_called = true;

        let record = match self.client.lookup(ip, &token).await {
            Ok(record) => record,
            Err(error) => {
                warn!("Enrichment failed for {}: {}", ip, error);
                EnrichmentRecord::unavailable(error)
            }
        };

        self.cache.insert(ip.to_string(), record.clone());
        record
    }

    /// Number of cached records (test observability).
    #[cfg(test)]
    pub(crate) fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::ScopeKind;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn enricher_for(server: &Server, token: Option<&str>) -> Enricher {
        let client = IpInfoClient::with_base_url(server.url_str("/")).unwrap();
        Enricher::new(client, token.map(String::from), Duration::ZERO)
    }

    #[tokio::test]
    async fn repeated_lookup_hits_network_once() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/8.8.8.8/json"))
                .times(1)
                .respond_with(json_encoded(serde_json::json!({
                    "org": "AS15169 Google LLC",
                    "city": "Mountain View"
                }))),
        );

        let mut enricher = enricher_for(&server, Some("token"));
        let first = enricher.lookup("8.8.8.8").await;
        let second = enricher.lookup("8.8.8.8").await;
        assert_eq!(first, second);
        assert_eq!(first.isp, "Google LLC");
        assert_eq!(first.error, None);
        assert_eq!(enricher.cached_count(), 1);
    }

    #[tokio::test]
    async fn scoped_addresses_never_hit_network() {
        // No expectations registered: any request would fail the test.
        let server = Server::run();
        let mut enricher = enricher_for(&server, Some("token"));

        for (ip, kind) in [
            ("192.168.1.1", ScopeKind::Private),
            ("127.0.0.1", ScopeKind::Loopback),
            ("169.254.0.5", ScopeKind::LinkLocal),
            ("224.0.0.1", ScopeKind::Multicast),
            ("240.0.0.1", ScopeKind::Reserved),
        ] {
            let record = enricher.lookup(ip).await;
            assert_eq!(record.error, Some(LookupError::Scope(kind)), "{}", ip);
            assert_eq!(record.isp, format!("Red {}", kind));
        }
        assert_eq!(enricher.cached_count(), 5);
    }

    #[tokio::test]
    async fn scoped_record_is_cached_verbatim() {
        let server = Server::run();
        let mut enricher = enricher_for(&server, Some("token"));
        let first = enricher.lookup("10.0.0.1").await;
        let second = enricher.lookup("10.0.0.1").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_token_short_circuits_without_network() {
        let server = Server::run();
        let mut enricher = enricher_for(&server, None);
        let record = enricher.lookup("8.8.8.8").await;
        assert_eq!(record.error, Some(LookupError::MissingToken));
        // Not cached: a token appearing mid-run would be honored.
        assert_eq!(enricher.cached_count(), 0);
    }

    #[tokio::test]
    async fn invalid_format_not_cached() {
        let server = Server::run();
        let mut enricher = enricher_for(&server, Some("token"));
        let record = enricher.lookup("8,8,8,8").await;
        assert_eq!(record.error, Some(LookupError::InvalidFormat));
        assert_eq!(enricher.cached_count(), 0);
    }

    #[tokio::test]
    async fn provider_errors_are_cached() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/9.9.9.9/json"))
                .times(1)
                .respond_with(status_code(404)),
        );

        let mut enricher = enricher_for(&server, Some("token"));
        let first = enricher.lookup("9.9.9.9").await;
        let second = enricher.lookup("9.9.9.9").await;
        assert_eq!(first.error, Some(LookupError::NotFound));
        assert_eq!(first, second);
        assert_eq!(first.city, "N/A");
    }
}
