//! Market intent — Polygon previous-close quote lookup.
//!
//! Candidate tickers are the uppercase alphabetic tokens of the query no
//! longer than five characters, tried in order. The first one Polygon
//! knows wins; common words that happen to look like tickers just come
//! back empty and are skipped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{contains_keyword, IntentMatcher};
use crate::adapters::REQUEST_TIMEOUT;

const MARKET_KEYWORDS: &[&str] = &[
    "stock", "price", "share", "nifty", "market", "nasdaq", "bse", "sensex",
];

const MAX_TICKER_LEN: usize = 5;

pub struct MarketMatcher {
    client: reqwest::Client,
    api_key: String,
}

impl MarketMatcher {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn previous_close(&self, ticker: &str) -> Result<String> {
        let body: Value = self
            .client
            .get(format!(
                "https://api.polygon.io/v2/aggs/ticker/{ticker}/prev"
            ))
            .query(&[("adjusted", "true"), ("apiKey", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;

        let close = body["results"][0]["c"]
            .as_f64()
            .context("response has no close price")?;
        Ok(format!("📈 {ticker}: Close = ${close}"))
    }
}

/// Uppercase alphabetic tokens of length ≤ 5, in query order.
pub(crate) fn candidate_tickers(query: &str) -> Vec<String> {
    query
        .to_uppercase()
        .split_whitespace()
        .filter(|w| w.len() <= MAX_TICKER_LEN && w.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_owned)
        .collect()
}

#[async_trait]
impl IntentMatcher for MarketMatcher {
    fn name(&self) -> &'static str {
        "market"
    }

    fn matches(&self, query: &str) -> bool {
        contains_keyword(query, MARKET_KEYWORDS)
    }

    async fn handle(&self, query: &str) -> Option<String> {
        for ticker in candidate_tickers(query) {
            match self.previous_close(&ticker).await {
                Ok(quote) => return Some(quote),
                Err(e) => {
                    debug!(%ticker, "quote lookup failed: {e:#}");
                }
            }
        }
        None
    }
}
