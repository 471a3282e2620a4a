//! Push-dashboard delivery client.
//!
//! The dashboard exposes no API, so delivery drives its web form workflow:
//! a cookie-backed session (persisted between runs), a login state machine,
//! per-request harvesting of whatever hidden anti-forgery fields the compose
//! page embeds, and a form-encoded submission whose only success signal is a
//! redirect into the push history.
//!
//! # Example
//!
//! ```no_run
//! use dashboard_push::{DashboardClient, DashboardConfig, PushDelivery};
//!
//! # async fn example(zones: geometry::ZonePayload) -> Result<(), dashboard_push::PushError> {
//! let config = DashboardConfig::new("https://example.dashboard.app")
//!     .with_credentials("ops@example.com", "secret");
//! let client = DashboardClient::new(config)?;
//!
//! client.load_cookies();
//! client.ensure_authenticated().await?;
//! let outcome = client.send_push("⚠️  Flood Warning issued. Tap for details!", &zones).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod forms;

pub use backoff::Backoff;
pub use client::{DashboardClient, PushOutcome, Rejection};
pub use config::{DashboardConfig, LOGIN_PATH, PUSH_HISTORY_PATH, PUSH_SEND_PATH};
pub use delivery::PushDelivery;
pub use error::PushError;
pub use forms::HiddenInputParser;
