//! Seen-alerts ledger for alertcast.
//!
//! A single SQLite table answers "have we already observed or delivered this
//! alert?" so duplicate pushes never go out across polls or process restarts.
//! Records carry first/last-seen timestamps; a monthly prune drops records
//! whose `last_seen_at` has aged past the retention window.
//!
//! # Example
//!
//! ```no_run
//! use ledger::{seen, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ledger::LedgerError> {
//!     let ledger = Ledger::connect("sqlite:alerts_seen.db?mode=rwc").await?;
//!     ledger.init().await?;
//!
//!     if !seen::is_seen(ledger.pool(), "urn:oid:2.49.0.1.840.0.abc").await? {
//!         seen::mark_seen(ledger.pool(), "urn:oid:2.49.0.1.840.0.abc").await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod seen;

pub use error::{LedgerError, Result};
pub use seen::SeenRecord;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Ledger database connection wrapper.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// The poll loop is the only writer; a small pool is plenty.
    const POOL_SIZE: u32 = 4;

    /// Connect to the ledger database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`;
    /// use `sqlite::memory:` for tests. The database file is created if it
    /// doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(Self::POOL_SIZE)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to seen-alerts ledger: {}", url);

        Ok(Self { pool })
    }

    /// Create the schema if it isn't there yet. Safe to call on every start.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_alerts (
                alert_id      TEXT PRIMARY KEY,
                first_seen_at TEXT NOT NULL,
                last_seen_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
