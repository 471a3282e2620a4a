//! Error types for the alerts-feed client.

use thiserror::Error;

/// Errors that can occur while talking to the alerts feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP transport or decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success, non-not-modified status from the feed.
    #[error("feed returned status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// A pagination reference that doesn't resolve to a URL.
    #[error("invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
