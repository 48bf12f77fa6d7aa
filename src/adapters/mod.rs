//! Search provider adapters — one per external search backend.
//!
//! Every backend implements [`SearchAdapter`]. The dispatcher only ever
//! sees the uniform contract: a query goes in, an optional snippet comes
//! out. Transport errors, timeouts, and malformed bodies never cross the
//! trait boundary — an adapter that cannot produce a snippet reports
//! `None` and logs the cause at debug level.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod google;
pub mod proxycrawl;
pub mod scraperapi;
pub mod searchapi;
pub mod serpapi;
pub mod zenserp;

use crate::config::Config;

/// Per-request timeout applied by every search adapter.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a single backend request failed to yield a snippet.
///
/// Internal to the adapters — the trait surface collapses all of these
/// to `None`.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("response missing field `{0}`")]
    MissingField(&'static str),
}

/// The uniform search backend contract.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Stable identifier, used in the rotation registry and state file.
    fn id(&self) -> &'static str;

    /// Fetch the first result snippet for a query.
    ///
    /// Never fails: any transport or parse problem is reported as `None`.
    async fn search(&self, query: &str) -> Option<String>;
}

/// Extract `body[list][0][field]` as an owned string.
///
/// The common shape of SERP-style APIs: an array of organic results with
/// a text field on each.
pub(crate) fn first_snippet(
    body: &Value,
    list: &'static str,
    field: &'static str,
) -> Result<String, SearchError> {
    body[list][0][field]
        .as_str()
        .map(str::to_owned)
        .ok_or(SearchError::MissingField(field))
}

/// Build the adapter set from config, in canonical rotation order.
///
/// An adapter is only registered when its credentials are configured, so
/// the rotation registry never contains a backend that cannot be called.
pub fn build_adapters(config: &Config) -> Vec<Box<dyn SearchAdapter>> {
    let mut adapters: Vec<Box<dyn SearchAdapter>> = Vec::new();

    if let Some(key) = &config.serpapi_key {
        adapters.push(Box::new(serpapi::SerpApiAdapter::new(key.clone())));
    }
    if let Some(key) = &config.zenserp_key {
        adapters.push(Box::new(zenserp::ZenserpAdapter::new(key.clone())));
    }
    if let (false, Some(cx)) = (config.google_keys.is_empty(), &config.google_cx) {
        adapters.push(Box::new(google::GoogleSearchAdapter::new(
            config.google_keys.clone(),
            cx.clone(),
        )));
    }
    if let Some(key) = &config.searchapi_key {
        adapters.push(Box::new(searchapi::SearchApiAdapter::new(key.clone())));
    }
    if !config.proxycrawl_keys.is_empty() {
        adapters.push(Box::new(proxycrawl::ProxyCrawlAdapter::new(
            config.proxycrawl_keys.clone(),
        )));
    }
    if !config.scraperapi_keys.is_empty() {
        adapters.push(Box::new(scraperapi::ScraperApiAdapter::new(
            config.scraperapi_keys.clone(),
        )));
    }

    adapters
}
