//! Error types for the push-dashboard client.

use thiserror::Error;

/// Errors that can occur when talking to the push dashboard.
#[derive(Debug, Error)]
pub enum PushError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Zone payload could not be encoded.
    #[error("zone payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// No credentials configured for the dashboard.
    #[error("missing dashboard credentials")]
    MissingCredentials,

    /// The dashboard stayed on the login page with a failure marker.
    #[error("dashboard rejected the login credentials")]
    LoginRejected,

    /// The push-compose page answered with something other than 200.
    #[error("compose page returned status {0}")]
    ComposePage(reqwest::StatusCode),

    /// Session cookie persistence failure.
    #[error("cookie store error: {0}")]
    CookieStore(String),

    /// Configuration that can't be turned into a working client.
    #[error("invalid dashboard configuration: {0}")]
    Config(String),
}
