//! SerpAPI adapter — Google results via serpapi.com.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{first_snippet, SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct SerpApiAdapter {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn fetch_snippet(&self, query: &str) -> Result<String, SearchError> {
        let body: Value = self
            .client
            .get("https://serpapi.com/search")
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        first_snippet(&body, "organic_results", "snippet")
    }
}

#[async_trait]
impl SearchAdapter for SerpApiAdapter {
    fn id(&self) -> &'static str {
        "serpapi"
    }

    async fn search(&self, query: &str) -> Option<String> {
        match self.fetch_snippet(query).await {
            Ok(snippet) => Some(snippet),
            Err(e) => {
                debug!(provider = "serpapi", "search failed: {e}");
                None
            }
        }
    }
}
