//! SearchApi.io adapter — Google results via searchapi.io.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{first_snippet, SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct SearchApiAdapter {
    client: reqwest::Client,
    api_key: String,
}

impl SearchApiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn fetch_snippet(&self, query: &str) -> Result<String, SearchError> {
        let body: Value = self
            .client
            .get("https://www.searchapi.io/api/v1/search")
            .query(&[
                ("q", query),
                ("engine", "google"),
                ("api_key", self.api_key.as_str()),
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
impl SearchAdapter for SearchApiAdapter {
    fn id(&self) -> &'static str {
        "searchapi"
    }

    async fn search(&self, query: &str) -> Option<String> {
        match self.fetch_snippet(query).await {
            Ok(snippet) => Some(snippet),
            Err(e) => {
                debug!(provider = "searchapi", "search failed: {e}");
                None
            }
        }
    }
}
