//! ProxyCrawl adapter — proxied Google search page fetch.
//!
//! ProxyCrawl returns raw HTML rather than structured results, so a
//! successful fetch is reported with a fixed availability string instead
//! of a parsed snippet. Multiple tokens are tried in order within one
//! call.

use async_trait::async_trait;
use tracing::debug;

use super::{SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct ProxyCrawlAdapter {
    client: reqwest::Client,
    tokens: Vec<String>,
}

impl ProxyCrawlAdapter {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
        }
    }

    async fn probe(&self, token: &str, query: &str) -> Result<(), SearchError> {
        let target = format!("https://www.google.com/search?q={query}");
        let resp = self
            .client
            .get("https://api.proxycrawl.com/")
            .query(&[("token", token), ("url", target.as_str())])
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
impl SearchAdapter for ProxyCrawlAdapter {
    fn id(&self) -> &'static str {
        "proxycrawl"
    }

    async fn search(&self, query: &str) -> Option<String> {
        for (i, token) in self.tokens.iter().enumerate() {
            match self.probe(token, query).await {
                Ok(()) => {
                    return Some(format!(
                        "ProxyCrawl search results available for '{query}'"
                    ))
                }
                Err(e) => {
                    debug!(provider = "proxycrawl", token_index = i, "search failed: {e}");
                }
            }
        }
        None
    }
}
