//! Error types for the upstream feed fetch.

use thiserror::Error;

/// Errors that can occur when fetching the channel feed from ThingSpeak.
///
/// All variants collapse into a single 500-class response at the HTTP
/// boundary; the distinction exists for logging and for callers that want
/// to inspect the failure mode.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or the API returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse the response body.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The API rejected the read key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for a response.
    #[error("request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}
