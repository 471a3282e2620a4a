//! Seen-alert record operations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::Result;

/// A deduplication record for one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SeenRecord {
    /// Upstream alert identifier.
    pub alert_id: String,
    /// When the alert first appeared in a poll (UTC, ISO-8601 seconds).
    pub first_seen_at: String,
    /// Refreshed every poll the alert is still present.
    pub last_seen_at: String,
}

/// Current UTC time as stored in the ledger.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Check whether an alert has been observed before.
pub async fn is_seen(pool: &SqlitePool, alert_id: &str) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1 FROM seen_alerts WHERE alert_id = ?
        "#,
    )
    .bind(alert_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Insert-or-refresh an alert's seen record.
///
/// Creates the record with `first_seen_at = now` when absent; always sets
/// `last_seen_at = now`. Safe to call redundantly; `first_seen_at` never
/// changes after the first call.
pub async fn mark_seen(pool: &SqlitePool, alert_id: &str) -> Result<()> {
    let stamp = now_stamp();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO seen_alerts (alert_id, first_seen_at, last_seen_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(alert_id)
    .bind(&stamp)
    .bind(&stamp)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE seen_alerts SET last_seen_at = ? WHERE alert_id = ?
        "#,
    )
    .bind(&stamp)
    .bind(alert_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Fetch one record, if present.
pub async fn get(pool: &SqlitePool, alert_id: &str) -> Result<Option<SeenRecord>> {
    let record = sqlx::query_as::<_, SeenRecord>(
        r#"
        SELECT alert_id, first_seen_at, last_seen_at
        FROM seen_alerts
        WHERE alert_id = ?
        "#,
    )
    .bind(alert_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Delete records last seen before the cutoff. Returns the number removed.
pub async fn prune_before(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64> {
    let cutoff_stamp = cutoff.to_rfc3339_opts(SecondsFormat::Secs, false);
    let result = sqlx::query(
        r#"
        DELETE FROM seen_alerts WHERE last_seen_at < ?
        "#,
    )
    .bind(&cutoff_stamp)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
