//! ScraperAPI adapter — proxied Google search page fetch.
//!
//! Like ProxyCrawl, this backend returns raw HTML; a 200 response is
//! reported with a fixed availability string. Keys are tried in order
//! within one call.

use async_trait::async_trait;
use tracing::debug;

use super::{SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct ScraperApiAdapter {
    client: reqwest::Client,
    api_keys: Vec<String>,
}

impl ScraperApiAdapter {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_keys,
        }
    }

    async fn probe(&self, key: &str, query: &str) -> Result<(), SearchError> {
        let target = format!("https://www.google.com/search?q={query}");
        let resp = self
            .client
            .get("http://api.scraperapi.com")
            .query(&[("api_key", key), ("url", target.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SearchError::Status(resp.status().as_u16()))
        }
    }
}

#[async_trait]
impl SearchAdapter for ScraperApiAdapter {
    fn id(&self) -> &'static str {
        "scraperapi"
    }

    async fn search(&self, query: &str) -> Option<String> {
        for (i, key) in self.api_keys.iter().enumerate() {
            match self.probe(key, query).await {
                Ok(()) => {
                    return Some(format!(
                        "ScraperAPI search results available for '{query}'"
                    ))
                }
                Err(e) => {
                    debug!(provider = "scraperapi", key_index = i, "search failed: {e}");
                }
            }
        }
        None
    }
}
