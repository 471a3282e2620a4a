//! Push-dashboard HTTP client.
//!
//! The dashboard has no API; pushes go through the same web forms a human
//! operator would use. The client keeps a cookie-backed session, probes its
//! own authentication state, harvests whatever hidden fields the compose page
//! currently embeds, and treats exactly one response, a redirect into the
//! push history, as an accepted submission.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, redirect, Client, Response, StatusCode};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use tracing::{debug, error, info, warn};

use geometry::ZonePayload;

use crate::backoff::Backoff;
use crate::config::{DashboardConfig, PUSH_HISTORY_PATH};
use crate::error::PushError;
use crate::forms::HiddenInputParser;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/146.0";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Markers that mean the response is the login page.
const LOGIN_FORM_MARKERS: [&str; 3] = [r#"id="form-index""#, r#"name="identification""#, r#"name="login""#];
/// Markers that mean the response is the push compose form.
const PUSH_FORM_MARKERS: [&str; 2] = [r#"id="form-push""#, r#"id="zones""#];
/// Body marker for a rejected login that still answers 200.
const LOGIN_FAILURE_MARKER: &str = "Cannot login";

/// Anti-bot trap field: must be present in the submission, must stay empty.
const HONEYPOT_FIELD: &str = "address";

const BODY_EXCERPT_LIMIT: usize = 300;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Result of one push submission.
///
/// Rejection is an outcome, not an error: the caller decides whether to
/// retry the alert on a later cycle.
#[derive(Debug)]
pub enum PushOutcome {
    /// Redirected into the push history: the dashboard queued the push.
    Delivered,
    Rejected(Rejection),
}

/// Diagnostics for a submission the dashboard did not accept.
#[derive(Debug)]
pub struct Rejection {
    /// Response status, or `None` when retries were exhausted without one.
    pub status: Option<u16>,
    /// Redirect target, when there was one.
    pub location: Option<String>,
    /// One-line body excerpt for log forensics.
    pub body_excerpt: String,
}

/// Client for one push dashboard account.
pub struct DashboardClient {
    http: Client,
    config: DashboardConfig,
    cookies: Arc<CookieStoreMutex>,
    forms: HiddenInputParser,
    backoff: Backoff,
}

impl DashboardClient {
    /// Build a client for the given dashboard.
    ///
    /// Redirects are never followed: every state transition in this protocol
    /// is signaled by a redirect we need to observe, not chase.
    pub fn new(config: DashboardConfig) -> Result<Self, PushError> {
        let cookies = Arc::new(CookieStoreMutex::new(CookieStore::default()));

        let origin = config.base_url.trim_end_matches('/');
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(
            header::ORIGIN,
            header::HeaderValue::from_str(origin)
                .map_err(|e| PushError::Config(format!("bad base URL for Origin header: {e}")))?,
        );

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .cookie_provider(Arc::clone(&cookies))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            config,
            cookies,
            forms: HiddenInputParser::new(),
            backoff: Backoff::default(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Probe whether the current session is authenticated.
    ///
    /// GETs the compose page without following redirects: a redirect or a
    /// login-form body means no; a body carrying the push form means yes.
    /// Transport errors count as "not logged in"; the caller will log in
    /// and find out.
    pub async fn is_logged_in(&self) -> bool {
        let url = self.config.push_send_url();
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "session probe failed");
                return false;
            }
        };

        if response.status().is_redirection() {
            return false;
        }
        if response.status() != StatusCode::OK {
            return false;
        }

        let body = response.text().await.unwrap_or_default();
        if LOGIN_FORM_MARKERS.iter().any(|marker| body.contains(marker)) {
            return false;
        }
        PUSH_FORM_MARKERS.iter().all(|marker| body.contains(marker))
    }

    /// Log in to the dashboard.
    ///
    /// A redirect response is success. A 200 carrying the failure marker is a
    /// credential error, fatal for this cycle, no point retrying it blindly.
    pub async fn login(&self) -> Result<(), PushError> {
        if !self.config.has_credentials() {
            return Err(PushError::MissingCredentials);
        }

        let login_url = self.config.login_url();
        // Seed session cookies before posting credentials.
        self.http.get(&login_url).send().await?;

        let form = [
            ("identification", "true"),
            ("login", self.config.login.as_str()),
            ("password", self.config.password.as_str()),
        ];
        let response = self.http.post(&login_url).form(&form).send().await?;
        let status = response.status();

        if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
            info!("dashboard login accepted");
            return Ok(());
        }
        if status == StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            if body.contains(LOGIN_FAILURE_MARKER) {
                return Err(PushError::LoginRejected);
            }
        }
        debug!(status = %status, "login answered without a redirect");
        Ok(())
    }

    /// Harvest every hidden field currently on the compose page.
    pub async fn harvest_hidden_inputs(&self) -> Result<HashMap<String, String>, PushError> {
        let url = self.config.push_send_url();
        let response = self.http.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(PushError::ComposePage(response.status()));
        }
        let body = response.text().await?;
        Ok(self.forms.parse(&body))
    }

    /// Submit one push.
    ///
    /// The submission echoes every harvested hidden field, overridden by the
    /// fixed message/scheduling/targeting fields; the honeypot field is sent
    /// empty. Timeouts are retried with backoff; exhausting the retry budget
    /// is a `Rejected` outcome, not an error.
    pub async fn submit(&self, message: &str, zones: &ZonePayload) -> Result<PushOutcome, PushError> {
        let mut form = self.harvest_hidden_inputs().await?;
        let schedule = ScheduleFields::now();
        let zones_json = serde_json::to_string(zones)?;

        let fixed = [
            ("action", "mod"),
            ("type", "simple"),
            ("linktype", ""),
            ("link", ""),
            ("pushDate", "now"),
            ("platform-target-ios", "ios"),
            ("platform-target-android", "android"),
            ("target", "select"),
            ("period_launch", "none"),
            ("pwa-target", "all"),
            ("pwa-period_launch", "none"),
            ("sound", "03"),
        ];
        for (name, value) in fixed {
            form.insert(name.to_string(), value.to_string());
        }
        form.insert("message".to_string(), message.to_string());
        form.insert("picker-date".to_string(), schedule.picker_date);
        form.insert("date".to_string(), schedule.iso_date);
        form.insert("heure".to_string(), schedule.heure);
        form.insert("hour-heure".to_string(), schedule.hour);
        form.insert("minutes-heure".to_string(), schedule.minutes);
        form.insert("zones".to_string(), zones_json);
        // Never populated; the dashboard drops submissions that fill it.
        form.insert(HONEYPOT_FIELD.to_string(), String::new());

        let url = self.config.push_send_url();
        match self.post_with_retry(&url, &form).await? {
            Some(response) => Ok(self.classify(response).await),
            None => {
                error!("push submit: exhausted retries without a response");
                Ok(PushOutcome::Rejected(Rejection {
                    status: None,
                    location: None,
                    body_excerpt: String::new(),
                }))
            }
        }
    }

    /// POST the form, retrying timeouts per the backoff policy.
    ///
    /// Only timeouts are retried here; any other transport error belongs to
    /// the caller.
    async fn post_with_retry(
        &self,
        url: &str,
        form: &HashMap<String, String>,
    ) -> Result<Option<Response>, PushError> {
        for attempt in 0..self.backoff.max_attempts() {
            let result = self
                .http
                .post(url)
                .header(header::REFERER, url)
                .form(form)
                .send()
                .await;
            match result {
                Ok(response) => return Ok(Some(response)),
                Err(e) if e.is_timeout() => {
                    let delay = self.backoff.delay(attempt);
                    error!(
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs_f64(),
                        "push submit timed out; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(PushError::Http(e)),
            }
        }
        Ok(None)
    }

    async fn classify(&self, response: Response) -> PushOutcome {
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if is_success_redirect(status, location.as_deref()) {
            return PushOutcome::Delivered;
        }

        if status.is_redirection() {
            let location_str = location.as_deref().unwrap_or("");
            error!(status = %status, location = %location_str, "push submit: unexpected redirect");
            return PushOutcome::Rejected(Rejection {
                status: Some(status.as_u16()),
                location,
                body_excerpt: String::new(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let body_excerpt = excerpt(&body, BODY_EXCERPT_LIMIT);
        error!(status = %status, location = ?location, body = %body_excerpt, "push submit: unexpected response");
        PushOutcome::Rejected(Rejection {
            status: Some(status.as_u16()),
            location,
            body_excerpt,
        })
    }

    /// Load the session cookie blob from disk. Best-effort: a missing or
    /// corrupt file just means logging in again.
    pub fn load_cookies(&self) {
        let path = &self.config.cookie_file;
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no saved session cookies");
                return;
            }
        };
        match CookieStore::load_json(BufReader::new(file)) {
            Ok(store) => {
                if let Ok(mut guard) = self.cookies.lock() {
                    *guard = store;
                    info!(path = %path.display(), "session cookies loaded");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cookie file");
            }
        }
    }

    /// Persist the session cookie blob to disk.
    pub fn save_cookies(&self) -> Result<(), PushError> {
        let path = &self.config.cookie_file;
        let mut writer = std::fs::File::create(path)
            .map(BufWriter::new)
            .map_err(|e| PushError::CookieStore(e.to_string()))?;
        let guard = self
            .cookies
            .lock()
            .map_err(|_| PushError::CookieStore("cookie store lock poisoned".to_string()))?;
        guard
            .save_json(&mut writer)
            .map_err(|e| PushError::CookieStore(e.to_string()))?;
        debug!(path = %path.display(), "session cookies saved");
        Ok(())
    }
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("config", &self.config)
            .finish()
    }
}

/// The one response shape that counts as an accepted push.
fn is_success_redirect(status: StatusCode, location: Option<&str>) -> bool {
    (status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND)
        && location.is_some_and(|loc| loc.starts_with(PUSH_HISTORY_PATH))
}

/// Flatten a body to one line and cap its length for logging.
fn excerpt(body: &str, limit: usize) -> String {
    let one_line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() <= limit {
        return one_line;
    }
    let cut: String = one_line.chars().take(limit - 3).collect();
    format!("{cut}...")
}

/// Local date/time components for a "send now" submission.
///
/// The dashboard ignores most of these when `pushDate=now`, but the observed
/// browser POST sends them, so we do too.
struct ScheduleFields {
    picker_date: String,
    iso_date: String,
    heure: String,
    hour: String,
    minutes: String,
}

impl ScheduleFields {
    fn now() -> Self {
        let local = chrono::Local::now();
        Self {
            picker_date: local.format("%m/%d/%Y").to_string(),
            iso_date: local.format("%Y-%m-%d").to_string(),
            heure: local.format("%H:%M").to_string(),
            hour: local.format("%H").to_string(),
            minutes: local.format("%M").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_to_history_is_success() {
        assert!(is_success_redirect(
            StatusCode::FOUND,
            Some("/manage/users/push/history/")
        ));
        assert!(is_success_redirect(
            StatusCode::MOVED_PERMANENTLY,
            Some("/manage/users/push/history/?sent=1")
        ));
    }

    #[test]
    fn test_other_redirects_are_failures() {
        assert!(!is_success_redirect(StatusCode::FOUND, Some("/manage/")));
        assert!(!is_success_redirect(StatusCode::FOUND, None));
        assert!(!is_success_redirect(
            StatusCode::SEE_OTHER,
            Some("/manage/users/push/history/")
        ));
    }

    #[test]
    fn test_plain_200_is_a_failure() {
        assert!(!is_success_redirect(
            StatusCode::OK,
            Some("/manage/users/push/history/")
        ));
    }

    #[test]
    fn test_excerpt_flattens_and_caps() {
        let flattened = excerpt("line one\n  line two\n", 300);
        assert_eq!(flattened, "line one line two");

        let long = "x".repeat(400);
        let capped = excerpt(&long, 300);
        assert_eq!(capped.chars().count(), 300);
        assert!(capped.ends_with("..."));
    }

    #[test]
    fn test_schedule_fields_shapes() {
        let schedule = ScheduleFields::now();
        assert_eq!(schedule.picker_date.len(), 10); // MM/DD/YYYY
        assert_eq!(schedule.iso_date.len(), 10); // YYYY-MM-DD
        assert_eq!(schedule.heure.len(), 5); // HH:MM
        assert_eq!(schedule.hour.len(), 2);
        assert_eq!(schedule.minutes.len(), 2);
    }
}
