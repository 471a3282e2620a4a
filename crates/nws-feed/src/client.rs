//! Alerts-feed HTTP client.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::NwsConfig;
use crate::error::FeedError;
use crate::models::{AlertCollection, ZoneDocument};

/// Feed filter applied to the first page of a pagination walk; later pages
/// carry their own cursor in the `next` URL.
const FIRST_PAGE_QUERY: &[(&str, &str)] = &[("region_type", "land"), ("message_type", "alert")];

const ACCEPT_GEOJSON: &str = "application/geo+json,application/json;q=0.9";

/// Conditional-cache validators from a prior response of one URL.
#[derive(Debug, Clone, Default)]
pub struct CacheTokens {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Client for the active-alerts feed and forecast-zone resources.
///
/// Remembers conditional-cache validators per URL, so repeat fetches of the
/// same resource turn into cheap not-modified answers.
pub struct NwsClient {
    http: Client,
    config: NwsConfig,
    cache: Mutex<HashMap<String, CacheTokens>>,
}

impl NwsClient {
    /// Build a client for the given configuration.
    pub fn new(config: NwsConfig) -> Result<Self, FeedError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_GEOJSON));

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &NwsConfig {
        &self.config
    }

    /// Start a pagination walk over the active-alerts feed.
    pub fn walk_pages(&self) -> PageWalker<'_> {
        PageWalker {
            client: self,
            next_url: Some(self.config.alerts_url.clone()),
            visited: HashSet::new(),
            index: 0,
        }
    }

    /// Fetch one forecast-zone resource.
    ///
    /// Always unconditional: zone boundaries are needed in full whenever an
    /// alert references them, never cached across polls.
    pub async fn fetch_zone(&self, url: &str) -> Result<ZoneDocument, FeedError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<ZoneDocument>().await?)
    }

    /// Conditional GET of a JSON document.
    ///
    /// Attaches `If-None-Match`/`If-Modified-Since` from the last successful
    /// response of this exact URL. A not-modified answer returns `Ok(None)`
    /// and leaves the stored validators untouched; a success stores the fresh
    /// validators; any other status is a `FeedError::Status`.
    pub(crate) async fn fetch_conditional<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Option<T>, FeedError> {
        let tokens = self.cached_tokens(url);

        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(etag) = &tokens.etag {
            request = request.header(header::IF_NONE_MATCH, etag.as_str());
        }
        if let Some(last_modified) = &tokens.last_modified {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified.as_str());
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(url, "feed resource unchanged");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FeedError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        self.store_tokens(url, &response);
        Ok(Some(response.json::<T>().await?))
    }

    fn cached_tokens(&self, url: &str) -> CacheTokens {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(url).cloned())
            .unwrap_or_default()
    }

    fn store_tokens(&self, url: &str, response: &reqwest::Response) {
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let tokens = CacheTokens {
            etag: header_value(header::ETAG),
            last_modified: header_value(header::LAST_MODIFIED),
        };
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), tokens);
        }
    }
}

impl std::fmt::Debug for NwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NwsClient")
            .field("config", &self.config)
            .finish()
    }
}

/// One yielded feed page.
#[derive(Debug)]
pub struct AlertPage {
    /// Zero-based page index within this walk.
    pub index: usize,
    /// The URL this page was fetched from.
    pub url: String,
    pub collection: AlertCollection,
}

/// Follows `pagination.next` references until the feed runs out.
///
/// Breaks cycles by never re-fetching a URL already visited in the same walk,
/// and stops cleanly on a not-modified answer.
pub struct PageWalker<'a> {
    client: &'a NwsClient,
    next_url: Option<String>,
    visited: HashSet<String>,
    index: usize,
}

impl PageWalker<'_> {
    /// Fetch the next page, or `None` when the walk is over.
    pub async fn next_page(&mut self) -> Result<Option<AlertPage>, FeedError> {
        let url = match self.next_url.take() {
            Some(url) => url,
            None => return Ok(None),
        };
        if !self.visited.insert(url.clone()) {
            debug!(url, "pagination cycle detected; stopping walk");
            return Ok(None);
        }

        let query = if self.index == 0 {
            Some(FIRST_PAGE_QUERY)
        } else {
            None
        };
        let collection: Option<AlertCollection> = self.client.fetch_conditional(&url, query).await?;
        let Some(collection) = collection else {
            return Ok(None);
        };

        if let Some(next) = collection
            .pagination
            .as_ref()
            .and_then(|p| p.next.as_deref())
        {
            self.next_url = Some(resolve_next(&url, next)?);
        }

        let page = AlertPage {
            index: self.index,
            url,
            collection,
        };
        self.index += 1;
        Ok(Some(page))
    }
}

/// Resolve a `next` reference against the page it came from.
fn resolve_next(base: &str, next: &str) -> Result<String, FeedError> {
    let base_url = reqwest::Url::parse(base).map_err(|e| FeedError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    let joined = base_url.join(next).map_err(|e| FeedError::InvalidUrl {
        url: next.to_string(),
        reason: e.to_string(),
    })?;
    Ok(joined.to_string())
}
