//! Answer synthesis — turn a raw search snippet into a final concise
//! answer via a local Ollama completion endpoint.
//!
//! A summarization failure is never an error at the call site: the
//! adapter returns [`SUMMARY_FAILURE`], a fixed sentinel the caller can
//! recognize. The raw snippet is never substituted for a failed
//! synthesis.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Sentinel returned in place of a synthesized answer when the
/// completion service is unreachable or returns an unusable response.
pub const SUMMARY_FAILURE: &str = "❌ The summarizer could not process the search results.";

const SUMMARY_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a final answer from the original query and a snippet.
    /// Infallible by contract; failures surface as [`SUMMARY_FAILURE`].
    async fn summarize(&self, query: &str, snippet: &str) -> String;
}

pub struct OllamaSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizer {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(SUMMARY_TIMEOUT)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await
            .context("completion request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("completion endpoint returned status {}", resp.status());
        }

        let body: Value = resp.json().await.context("completion body is not JSON")?;
        body["response"]
            .as_str()
            .map(|s| s.trim().to_string())
            .context("completion body has no `response` field")
    }
}

fn build_prompt(query: &str, snippet: &str) -> String {
    format!(
        "Based on the following search results, provide a brief, concise, \
         and direct answer to the user's query.\n\n\
         User Query: {query}\n\n\
         Search Results:\n{snippet}\n\n\
         Final Answer:"
    )
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, query: &str, snippet: &str) -> String {
        debug!(model = %self.model, "sending snippet for final answer synthesis");
        match self.complete(&build_prompt(query, snippet)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("summarization failed: {e:#}");
                SUMMARY_FAILURE.to_string()
            }
        }
    }
}
