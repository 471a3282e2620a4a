//! Process configuration.
//!
//! One immutable `Config` is built from the environment at startup and handed
//! into each component's constructor; nothing reads the environment after
//! that.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use dashboard_push::DashboardConfig;
use geometry::SimplifyParams;
use nws_feed::DEFAULT_ALERTS_URL;

/// Event categories that never produce a push.
const DEFAULT_IGNORED_EVENTS: &str = "Small Craft Advisory,Special Marine Warning";

/// Configuration the process can't start without, or can't parse.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything tunable about one poller process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Active-alerts feed URL.
    pub feed_url: String,
    /// Contact-identifying User-Agent for the feed.
    pub user_agent: String,
    /// Ledger database URL (`sqlite:...`).
    pub ledger_db: String,
    /// Delay between poll iterations.
    pub poll_interval: Duration,
    /// Event categories to skip entirely.
    pub ignored_events: Vec<String>,
    /// Boundary simplification knobs.
    pub simplify: SimplifyParams,
    /// Push dashboard endpoint and credentials.
    pub dashboard: DashboardConfig,
    /// Where rolling log files are written and pruned.
    pub log_dir: PathBuf,
}

impl Config {
    /// Build the configuration from environment variables.
    ///
    /// `DASHBOARD_BASE` is required; credentials may be absent (login will
    /// fail cleanly each cycle until they're provided). Everything else has
    /// a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("DASHBOARD_BASE").map_err(|_| ConfigError::Missing("DASHBOARD_BASE"))?;
        let dashboard = DashboardConfig::new(base_url)
            .with_credentials(
                env_or("DASHBOARD_LOGIN", ""),
                env_or("DASHBOARD_PASSWORD", ""),
            )
            .with_cookie_file(env_or("COOKIE_FILE", "dashboard_cookies.json"));

        let simplify = SimplifyParams {
            enabled: parse_env("SIMPLIFY_ENABLED", true)?,
            tolerance: parse_env("SIMPLIFY_TOLERANCE", 0.001)?,
            max_points: parse_env("MAX_POINTS", 300)?,
            preferred_points: parse_env("PREFERRED_POINTS", 250)?,
        };

        let ignored_events = env_or("IGNORED_EVENTS", DEFAULT_IGNORED_EVENTS)
            .split(',')
            .map(str::trim)
            .filter(|event| !event.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            feed_url: env_or("NWS_ALERTS_URL", DEFAULT_ALERTS_URL),
            user_agent: env_or("NWS_USER_AGENT", "alertcast/0.1 (contact: ops@example.com)"),
            ledger_db: env_or("SEEN_ALERTS_DB", "sqlite:alerts_seen.db?mode=rwc"),
            poll_interval: Duration::from_secs(parse_env("POLL_INTERVAL", 60)?),
            ignored_events,
            simplify,
            dashboard,
            log_dir: PathBuf::from(env_or("LOG_DIR", "logs")),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
