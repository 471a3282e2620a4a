//! The poll loop: fetch, dedup, resolve, simplify, format, deliver.

use std::time::Duration;

use chrono::{Datelike, SecondsFormat, Utc};
use rand::Rng;
use tracing::{debug, error, info, warn};

use dashboard_push::{PushDelivery, PushOutcome};
use ledger::{seen, Ledger};
use nws_feed::{AlertFeature, AlertPage, NwsClient};

use crate::config::Config;
use crate::logs;
use crate::notify::NotificationFormatter;

/// Ledger and log retention window.
const RETENTION_DAYS: i64 = 30;
/// Pushes allowed before the longer anti-burst pause kicks in.
const PUSH_BURST_LIMIT: u32 = 24;

/// Drives the pipeline: one poll iteration at a time, forever.
pub struct PollService<P: PushDelivery> {
    config: Config,
    nws: NwsClient,
    ledger: Ledger,
    push: P,
    formatter: NotificationFormatter,
    /// (year, month) of the last maintenance pass, so it runs once per month.
    last_prune: Option<(i32, u32)>,
}

impl<P: PushDelivery> PollService<P> {
    pub fn new(config: Config, nws: NwsClient, ledger: Ledger, push: P) -> Self {
        Self {
            config,
            nws,
            ledger,
            push,
            formatter: NotificationFormatter::new(),
            last_prune: None,
        }
    }

    /// Poll forever, sleeping the configured interval between iterations
    /// regardless of how long each took.
    pub async fn run(&mut self) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            feed = %self.config.feed_url,
            dashboard = %self.config.dashboard.base_url,
            "starting alert poller"
        );
        loop {
            self.poll_once().await;
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One poll iteration. Never panics the loop: every failure class is
    /// logged and contained here.
    pub async fn poll_once(&mut self) {
        self.maybe_monthly_prune().await;

        if let Err(e) = self.push.ensure_authenticated().await {
            error!(error = %e, "dashboard authentication failed; skipping this cycle");
            return;
        }

        let mut pages = self.nws.walk_pages();
        loop {
            match pages.next_page().await {
                Ok(Some(page)) => self.process_page(&page).await,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "alert feed fetch failed");
                    break;
                }
            }
        }
    }

    async fn process_page(&self, page: &AlertPage) {
        let features = &page.collection.features;
        let fresh = self.partition_new(features).await;
        info!(
            page = page.index,
            active = features.len(),
            new = fresh.len(),
            url = %page.url,
            "feed page"
        );

        let mut pushes = 0u32;
        for alert in fresh {
            self.process_alert(alert, &mut pushes).await;
        }
    }

    /// Split a page into never-seen alerts (returned) and already-seen ones,
    /// refreshing `last_seen_at` for the latter so they outlive the prune
    /// while still active.
    async fn partition_new<'f>(&self, features: &'f [AlertFeature]) -> Vec<&'f AlertFeature> {
        let mut fresh = Vec::new();
        for feature in features {
            let Some(id) = feature.alert_id() else {
                continue;
            };
            match seen::is_seen(self.ledger.pool(), id).await {
                Ok(false) => fresh.push(feature),
                Ok(true) => {
                    if let Err(e) = seen::mark_seen(self.ledger.pool(), id).await {
                        warn!(alert = id, error = %e, "failed to refresh seen record");
                    }
                }
                Err(e) => {
                    warn!(alert = id, error = %e, "seen lookup failed; skipping alert");
                }
            }
        }
        fresh
    }

    async fn process_alert(&self, alert: &AlertFeature, pushes: &mut u32) {
        let Some(id) = alert.alert_id() else {
            return;
        };
        let event = alert.event();

        if self.config.ignored_events.iter().any(|ignored| ignored == event) {
            debug!(alert = id, event, "ignored event category");
            return;
        }
        if alert.properties.message_type.as_deref() != Some("Alert") {
            debug!(
                alert = id,
                message_type = ?alert.properties.message_type,
                "informational message type; skipping"
            );
            return;
        }

        let headline = alert.properties.headline.clone().unwrap_or_default();
        info!(alert = id, event, headline = %headline, "new alert");

        if !alert.has_polygonal_geometry() && alert.properties.affected_zones.is_empty() {
            info!(alert = id, "no boundary source; marking seen without delivery");
            self.mark_seen(id).await;
            return;
        }

        let candidates = self.nws.resolve_geometries(alert).await;
        if candidates.is_empty() {
            info!(alert = id, "no usable boundary; marking seen without delivery");
            self.mark_seen(id).await;
            return;
        }
        debug!(alert = id, candidates = candidates.len(), "boundary candidates resolved");

        let shapes: Vec<_> = candidates
            .iter()
            .filter_map(|candidate| geometry::polygonal(&candidate.geometry))
            .collect();
        let payload = geometry::union_all(&shapes)
            .and_then(|unioned| geometry::to_zone_payload(&unioned, &self.config.simplify));
        let Some(payload) = payload else {
            info!(
                alert = id,
                candidates = candidates.len(),
                "boundary collapsed in union/simplification; marking seen without delivery"
            );
            self.mark_seen(id).await;
            return;
        };
        debug!(
            alert = id,
            rings = payload.ring_count(),
            points = payload.point_count(),
            "zone payload ready"
        );

        let raw = if headline.is_empty() {
            event.to_string()
        } else {
            headline
        };
        let message = self.formatter.format(&raw);

        pace_between_pushes().await;
        match self.push.send_push(&message, &payload).await {
            Ok(PushOutcome::Delivered) => {
                info!(alert = id, "push accepted by dashboard");
                self.mark_seen(id).await;
            }
            Ok(PushOutcome::Rejected(rejection)) => {
                error!(
                    alert = id,
                    status = ?rejection.status,
                    location = ?rejection.location,
                    body = %rejection.body_excerpt,
                    "push rejected; will retry next cycle"
                );
            }
            Err(e) => {
                error!(alert = id, error = %e, "push failed; will retry next cycle");
            }
        }

        *pushes += 1;
        if *pushes % PUSH_BURST_LIMIT == 0 {
            let pause = Duration::from_secs_f64(rand::thread_rng().gen_range(60.0..180.0));
            info!(pause_secs = pause.as_secs(), "push burst limit reached; pausing");
            tokio::time::sleep(pause).await;
        }
    }

    async fn mark_seen(&self, id: &str) {
        if let Err(e) = seen::mark_seen(self.ledger.pool(), id).await {
            warn!(alert = id, error = %e, "failed to mark alert seen");
        }
    }

    /// On the first poll of each calendar month, drop ledger records and log
    /// files older than the retention window.
    async fn maybe_monthly_prune(&mut self) {
        let now = Utc::now();
        if now.day() != 1 {
            return;
        }
        let key = (now.year(), now.month());
        if self.last_prune == Some(key) {
            return;
        }

        let cutoff = now - chrono::Duration::days(RETENTION_DAYS);
        match seen::prune_before(self.ledger.pool(), cutoff).await {
            Ok(removed) => info!(
                removed,
                cutoff = %cutoff.to_rfc3339_opts(SecondsFormat::Secs, false),
                "monthly prune: seen alerts"
            ),
            Err(e) => warn!(error = %e, "monthly ledger prune failed"),
        }
        let removed = logs::prune_before(&self.config.log_dir, cutoff);
        info!(removed, "monthly prune: log files");

        self.last_prune = Some(key);
    }
}

/// Short randomized delay between individual pushes, so bursts of alerts
/// don't trip the dashboard's abuse protection.
async fn pace_between_pushes() {
    let delay = Duration::from_secs_f64(rand::thread_rng().gen_range(1.5..3.0));
    tokio::time::sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dashboard_push::{DashboardConfig, PushError, Rejection};
    use geometry::{SimplifyParams, ZonePayload};
    use nws_feed::NwsConfig;

    #[derive(Debug, Clone, Copy)]
    enum MockMode {
        Deliver,
        Reject,
    }

    /// Records every push and answers with a fixed outcome.
    struct MockDelivery {
        mode: MockMode,
        pushes: Mutex<Vec<String>>,
    }

    impl MockDelivery {
        fn new(mode: MockMode) -> Self {
            Self {
                mode,
                pushes: Mutex::new(Vec::new()),
            }
        }

        fn push_count(&self) -> usize {
            self.pushes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PushDelivery for MockDelivery {
        async fn ensure_authenticated(&self) -> Result<(), PushError> {
            Ok(())
        }

        async fn send_push(
            &self,
            message: &str,
            _zones: &ZonePayload,
        ) -> Result<PushOutcome, PushError> {
            self.pushes.lock().unwrap().push(message.to_string());
            Ok(match self.mode {
                MockMode::Deliver => PushOutcome::Delivered,
                MockMode::Reject => PushOutcome::Rejected(Rejection {
                    status: Some(200),
                    location: None,
                    body_excerpt: String::new(),
                }),
            })
        }
    }

    fn test_config() -> Config {
        Config {
            feed_url: nws_feed::DEFAULT_ALERTS_URL.to_string(),
            user_agent: "alertcast-tests/0 (contact: dev@example.com)".to_string(),
            ledger_db: "sqlite::memory:".to_string(),
            poll_interval: Duration::from_secs(60),
            ignored_events: vec!["Small Craft Advisory".to_string()],
            simplify: SimplifyParams::default(),
            dashboard: DashboardConfig::new("https://example.dashboard.app"),
            log_dir: PathBuf::from("logs"),
        }
    }

    async fn test_service(mode: MockMode) -> PollService<MockDelivery> {
        let ledger = Ledger::connect("sqlite::memory:").await.unwrap();
        ledger.init().await.unwrap();
        let nws = NwsClient::new(NwsConfig::default()).unwrap();
        PollService::new(test_config(), nws, ledger, MockDelivery::new(mode))
    }

    fn alert(id: &str, with_geometry: bool) -> AlertFeature {
        let mut value = serde_json::json!({
            "id": id,
            "properties": {
                "id": id,
                "event": "Flood Warning",
                "headline": "Flood Warning issued for the area",
                "messageType": "Alert",
                "affectedZones": []
            }
        });
        if with_geometry {
            value["geometry"] = serde_json::json!({
                "type": "Polygon",
                "coordinates": [[[-105.0, 40.0], [-104.0, 40.0], [-104.0, 41.0], [-105.0, 41.0], [-105.0, 40.0]]]
            });
        }
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_partition_splits_new_from_seen_and_refreshes() {
        let service = test_service(MockMode::Deliver).await;

        // Pre-age one alert so the refresh is observable.
        sqlx::query(
            "INSERT INTO seen_alerts (alert_id, first_seen_at, last_seen_at) VALUES (?, ?, ?)",
        )
        .bind("urn:x:seen")
        .bind("2026-01-01T00:00:00+00:00")
        .bind("2026-01-01T00:00:00+00:00")
        .execute(service.ledger.pool())
        .await
        .unwrap();

        let features = vec![
            alert("urn:x:new-1", true),
            alert("urn:x:seen", true),
            alert("urn:x:new-2", false),
        ];
        let fresh = service.partition_new(&features).await;

        let fresh_ids: Vec<_> = fresh.iter().filter_map(|f| f.alert_id()).collect();
        assert_eq!(fresh_ids, vec!["urn:x:new-1", "urn:x:new-2"]);

        let record = seen::get(service.ledger.pool(), "urn:x:seen")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.first_seen_at, "2026-01-01T00:00:00+00:00");
        assert!(record.last_seen_at > record.first_seen_at);
    }

    #[tokio::test]
    async fn test_alert_without_boundary_never_reaches_delivery() {
        let service = test_service(MockMode::Deliver).await;
        let mut pushes = 0;

        service.process_alert(&alert("urn:x:nogeo", false), &mut pushes).await;

        assert_eq!(service.push.push_count(), 0);
        assert!(seen::is_seen(service.ledger.pool(), "urn:x:nogeo")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delivered_push_marks_seen() {
        let service = test_service(MockMode::Deliver).await;
        let mut pushes = 0;

        service.process_alert(&alert("urn:x:ok", true), &mut pushes).await;

        assert_eq!(service.push.push_count(), 1);
        assert!(seen::is_seen(service.ledger.pool(), "urn:x:ok")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rejected_push_leaves_alert_unmarked() {
        let service = test_service(MockMode::Reject).await;
        let mut pushes = 0;

        service.process_alert(&alert("urn:x:fail", true), &mut pushes).await;

        assert_eq!(service.push.push_count(), 1);
        assert!(!seen::is_seen(service.ledger.pool(), "urn:x:fail")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_ignored_event_is_skipped_without_marking() {
        let service = test_service(MockMode::Deliver).await;
        let mut alert = alert("urn:x:marine", true);
        alert.properties.event = Some("Small Craft Advisory".to_string());
        let mut pushes = 0;

        service.process_alert(&alert, &mut pushes).await;

        assert_eq!(service.push.push_count(), 0);
        assert!(!seen::is_seen(service.ledger.pool(), "urn:x:marine")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_update_message_type_is_skipped() {
        let service = test_service(MockMode::Deliver).await;
        let mut alert = alert("urn:x:update", true);
        alert.properties.message_type = Some("Update".to_string());
        let mut pushes = 0;

        service.process_alert(&alert, &mut pushes).await;

        assert_eq!(service.push.push_count(), 0);
    }
}
