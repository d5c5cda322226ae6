//! Geolocation/ISP enrichment.
//!
//! [`IpInfoClient`] talks to the provider; [`Enricher`] layers the per-run
//! cache, the reserved-range fast path, and pacing on top of it.

mod cache;
mod client;
mod types;

pub use cache::Enricher;
pub use client::IpInfoClient;
pub use types::{EnrichmentRecord, LookupError, FIELD_UNAVAILABLE};
