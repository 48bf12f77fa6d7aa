//! Zenserp adapter — SERP results via zenserp.com.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{first_snippet, SearchAdapter, SearchError, REQUEST_TIMEOUT};

pub struct ZenserpAdapter {
    client: reqwest::Client,
    api_key: String,
}

impl ZenserpAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn fetch_snippet(&self, query: &str) -> Result<String, SearchError> {
        let body: Value = self
            .client
            .get("https://app.zenserp.com/api/v2/search")
            .query(&[("q", query), ("apikey", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        // Zenserp calls its result list "organic" and its text "description".
        first_snippet(&body, "organic", "description")
    }
}

#[async_trait]
impl SearchAdapter for ZenserpAdapter {
    fn id(&self) -> &'static str {
        "zenserp"
    }

    async fn search(&self, query: &str) -> Option<String> {
        match self.fetch_snippet(query).await {
            Ok(snippet) => Some(snippet),
            Err(e) => {
                debug!(provider = "zenserp", "search failed: {e}");
                None
            }
        }
    }
}
