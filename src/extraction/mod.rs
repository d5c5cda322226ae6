//! AI-based candidate extraction.
//!
//! [`GeminiClient`] performs the service call; [`payload`] holds the pure
//! defensive post-processing of whatever text comes back.

mod client;
pub mod payload;
mod types;

pub use client::GeminiClient;
pub use types::{Candidate, ExtractionError};
