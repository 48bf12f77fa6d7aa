//! Secondary-source fallback — Wikipedia intro extracts.
//!
//! Used only after every search provider has failed or been disabled.
//! The contract mirrors the search adapters: transport failures and
//! missing pages collapse to `None`, never an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::adapters::REQUEST_TIMEOUT;

const WIKI_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Fetch a summary extract for a topic, or `None` if the source
    /// cannot produce one.
    async fn lookup(&self, topic: &str) -> Option<String>;
}

pub struct WikipediaSource {
    client: reqwest::Client,
}

impl WikipediaSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_extract(&self, topic: &str) -> Result<String> {
        let body: Value = self
            .client
            .get(WIKI_ENDPOINT)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("titles", topic),
                ("exintro", "1"),
                ("format", "json"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        first_page_extract(&body)
    }
}

/// Pull the intro extract out of a MediaWiki query response. The pages
/// map is keyed by page id; a title with no article comes back as a
/// single page carrying the API's `missing` marker.
fn first_page_extract(body: &Value) -> Result<String> {
    let pages = body["query"]["pages"]
        .as_object()
        .context("response has no pages")?;
    let page = pages.values().next().context("pages map is empty")?;
    if !page["missing"].is_null() {
        anyhow::bail!("no article for this title");
    }
    page["extract"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .context("page has no extract")
}

#[async_trait]
impl ReferenceSource for WikipediaSource {
    async fn lookup(&self, topic: &str) -> Option<String> {
        match self.fetch_extract(topic).await {
            Ok(extract) => Some(extract),
            Err(e) => {
                debug!(topic, "reference lookup failed: {e:#}");
                None
            }
        }
    }
}
