//! Configuration for the alerts-feed client.

use std::time::Duration;

/// The nationwide active-alerts endpoint.
pub const DEFAULT_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";

/// Configuration for connecting to the alerts feed.
///
/// The feed requires a contact-identifying User-Agent; set one that points at
/// whoever operates this poller.
#[derive(Debug, Clone)]
pub struct NwsConfig {
    /// Active-alerts feed URL.
    pub alerts_url: String,
    /// Contact-identifying User-Agent sent on every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl NwsConfig {
    /// Create a new configuration with the given feed URL and User-Agent.
    pub fn new(alerts_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            alerts_url: alerts_url.into(),
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl Default for NwsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALERTS_URL, "alertcast/0.1 (contact: ops@example.com)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_active_alerts() {
        let config = NwsConfig::default();
        assert_eq!(config.alerts_url, DEFAULT_ALERTS_URL);
        assert_eq!(config.timeout, Duration::from_secs(20));
    }
}
