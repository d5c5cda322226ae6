//! Enrichment data structures.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::ip::ScopeKind;

/// Placeholder used for every geo field the provider could not supply.
pub const FIELD_UNAVAILABLE: &str = "N/A";

/// Why a lookup produced no (or partial) provider data.
///
/// The `Display` strings are the report-facing error tags and must stay
/// stable; exports and frontends show them verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    /// The string is not a syntactically valid IP address.
    #[error("IP Inválida (Formato)")]
    InvalidFormat,

    /// No provider token is configured.
    #[error("Token Faltante")]
    MissingToken,

    /// The address is in a reserved-use range; no lookup was attempted.
    #[error("IP {0}")]
    Scope(ScopeKind),

    /// The provider did not answer within the lookup timeout.
    #[error("Timeout IPinfo")]
    Timeout,

    /// HTTP 401/403: the token is invalid or forbidden.
    #[error("Token Inválido/Prohibido")]
    Unauthorized,

    /// HTTP 404: the provider has no data for this address.
    #[error("No Encontrado (ipinfo)")]
    NotFound,

    /// HTTP 429: the provider's rate limit was hit.
    #[error("Límite API Excedido")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("HTTP Error {0}")]
    Http(u16),

    /// The provider could not be reached.
    #[error("Error de Conexión")]
    Connection,

    /// The response body was not the expected JSON document.
    #[error("Respuesta Inválida")]
    MalformedBody,

    /// Anything else.
    #[error("Error Interno (IPinfo)")]
    Internal,
}

impl LookupError {
    /// Categorizes a transport-level `reqwest::Error`.
    ///
    /// Status-bearing errors are classified by status first, then by the
    /// reqwest error kind.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::from_status(status.as_u16());
        }
        if error.is_timeout() {
            LookupError::Timeout
        } else if error.is_connect() {
            LookupError::Connection
        } else if error.is_body() || error.is_decode() {
            LookupError::MalformedBody
        } else {
            LookupError::Internal
        }
    }

    /// Classifies a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => LookupError::Unauthorized,
            404 => LookupError::NotFound,
            429 => LookupError::RateLimited,
            other => LookupError::Http(other),
        }
    }
}

impl Serialize for LookupError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Geolocation/ISP data for one IP address.
///
/// Exactly one record exists per unique IP per run. Once cached by the
/// [`Enricher`](super::Enricher) it is never mutated; a cache hit returns
/// the value computed on first access.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRecord {
    /// ISP or organization name, with any leading `AS<n>` token stripped.
    pub isp: String,
    /// City name.
    pub city: String,
    /// Region/state name.
    pub region: String,
    /// Country code.
    pub country: String,
    /// Reverse hostname.
    pub hostname: String,
    /// `None` only for a fully successful provider lookup.
    pub error: Option<LookupError>,
}

impl EnrichmentRecord {
    /// A record with every geo field defaulted and the given error tag.
    pub fn unavailable(error: LookupError) -> Self {
        EnrichmentRecord {
            isp: FIELD_UNAVAILABLE.to_string(),
            city: FIELD_UNAVAILABLE.to_string(),
            region: FIELD_UNAVAILABLE.to_string(),
            country: FIELD_UNAVAILABLE.to_string(),
            hostname: FIELD_UNAVAILABLE.to_string(),
            error: Some(error),
        }
    }

    /// The fast-path record for a reserved-use address.
    pub fn scoped(kind: ScopeKind) -> Self {
        EnrichmentRecord {
            isp: format!("Red {}", kind),
            ..EnrichmentRecord::unavailable(LookupError::Scope(kind))
        }
    }
}

/// Wire shape of the provider's JSON response.
#[derive(Debug, Deserialize)]
pub(crate) struct IpInfoResponse {
    pub(crate) org: Option<String>,
    pub(crate) isp: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) country: Option<String>,
    pub(crate) hostname: Option<String>,
}
