//! NWS active-alerts feed client.
//!
//! This crate handles everything upstream of the pipeline: conditionally
//! cached fetches of the active-alerts feed, pagination across feed pages,
//! and dereferencing forecast-zone URLs into candidate boundary geometries.
//!
//! # Example
//!
//! ```no_run
//! use nws_feed::{NwsClient, NwsConfig};
//!
//! # async fn example() -> Result<(), nws_feed::FeedError> {
//! let client = NwsClient::new(NwsConfig::default())?;
//!
//! let mut pages = client.walk_pages();
//! while let Some(page) = pages.next_page().await? {
//!     println!("page {}: {} active alerts", page.index, page.collection.features.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resolve;

pub use client::{AlertPage, CacheTokens, NwsClient, PageWalker};
pub use config::{NwsConfig, DEFAULT_ALERTS_URL};
pub use error::FeedError;
pub use models::{AlertCollection, AlertFeature, AlertProperties, Pagination, ZoneDocument, ZoneFeature};
pub use resolve::{GeometryCandidate, Provenance};
