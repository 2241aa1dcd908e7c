//! Error types for quakeseq.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur in quakeseq operations.
#[derive(Error, Debug)]
pub enum QuakeseqError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// API returned an error status
    #[error("USGS API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response structure
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A required scalar is missing or out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A feed record lacks the geometry, time or magnitude needed for aggregation
    #[error("Malformed event {id}: {reason}")]
    MalformedEvent { id: String, reason: String },
}
