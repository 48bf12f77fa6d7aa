//! Google Custom Search adapter.
//!
//! Holds an ordered pool of interchangeable API keys and walks it within
//! a single call: the first key that yields a parseable snippet wins,
//! and exhausting the pool is the same as having no result.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{first_snippet, SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct GoogleSearchAdapter {
    client: reqwest::Client,
    api_keys: Vec<String>,
    cx: String,
}

impl GoogleSearchAdapter {
    pub fn new(api_keys: Vec<String>, cx: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_keys,
            cx,
        }
    }

    async fn fetch_snippet(&self, query: &str, key: &str) -> Result<String, SearchError> {
        let body: Value = self
            .client
            .get("https://www.googleapis.com/customsearch/v1")
            .query(&[("key", key), ("cx", self.cx.as_str()), ("q", query)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        first_snippet(&body, "items", "snippet")
    }
}

#[async_trait]
impl SearchAdapter for GoogleSearchAdapter {
    fn id(&self) -> &'static str {
        "google"
    }

    async fn search(&self, query: &str) -> Option<String> {
        for (i, key) in self.api_keys.iter().enumerate() {
            match self.fetch_snippet(query, key).await {
                Ok(snippet) => return Some(snippet),
                Err(e) => {
                    debug!(provider = "google", key_index = i, "search failed: {e}");
                }
            }
        }
        None
    }
}
