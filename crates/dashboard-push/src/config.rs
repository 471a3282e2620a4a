//! Configuration for the push-dashboard client.

use std::path::PathBuf;

/// Login form path; also where an expired session gets redirected.
pub const LOGIN_PATH: &str = "/manage/";
/// Push compose-and-submit path.
pub const PUSH_SEND_PATH: &str = "/manage/users/push/send/";
/// Redirect target that signals an accepted push.
pub const PUSH_HISTORY_PATH: &str = "/manage/users/push/history/";

/// Configuration for one push dashboard.
#[derive(Clone)]
pub struct DashboardConfig {
    /// Dashboard origin, e.g. `https://example.dashboard.app`.
    pub base_url: String,
    /// Account login (email).
    pub login: String,
    pub password: String,
    /// Where the session cookie blob lives between runs.
    pub cookie_file: PathBuf,
}

impl DashboardConfig {
    /// Create a configuration with no credentials and the default cookie file.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login: String::new(),
            password: String::new(),
            cookie_file: PathBuf::from("dashboard_cookies.json"),
        }
    }

    /// Set the account credentials.
    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = login.into();
        self.password = password.into();
        self
    }

    /// Set the session cookie file path.
    pub fn with_cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = path.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.login.is_empty() && !self.password.is_empty()
    }

    /// Get the login page URL.
    pub fn login_url(&self) -> String {
        self.absolute(LOGIN_PATH)
    }

    /// Get the push compose/submit URL.
    pub fn push_send_url(&self) -> String {
        self.absolute(PUSH_SEND_PATH)
    }

    fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("cookie_file", &self.cookie_file)
            .finish()
    }
}
