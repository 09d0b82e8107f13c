//! Fetch error taxonomy shared by all venue adapters

use thiserror::Error;

/// Errors an adapter can surface before the timed wrapper flattens them
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx HTTP status from a venue endpoint
    #[error("HTTP {0}")]
    Http(u16),

    /// Transport-level failure (DNS, TLS, timeout, body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Expected field missing or malformed in the response body
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Numeric decode produced NaN/Infinity, or non-positive where positivity is required
    #[error("non-finite value: {0}")]
    NonFinite(String),

    /// Expected instrument key absent from a keyed response
    #[error("not found: {0}")]
    NotFound(String),
}
