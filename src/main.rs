//! Answerline — resilient multi-provider answer dispatch daemon.
//!
//! Runs as a system service, listening on a Unix socket for JSON-RPC
//! requests. A free-text query is routed through direct-lookup intents
//! (weather, market quotes), then a rotating chain of search providers
//! with quota-aware disablement, then a Wikipedia fallback; snippets are
//! synthesized into a final answer by a local Ollama model.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

mod adapters;
mod config;
mod dispatch;
mod engine;
mod intent;
mod server;
mod summarize;
mod wiki;

use config::Config;
use dispatch::rotation::{FileStateStore, StateStore};
use dispatch::Dispatcher;
use engine::AnswerEngine;
use summarize::OllamaSummarizer;
use wiki::WikipediaSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (structured logs)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "answerline=info".into()),
        )
        .with_target(false)
        .init();

    info!("🔎 Answerline v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data_dir = Config::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    let config = Config::load(&data_dir).context("Failed to load configuration")?;

    // ── Search Providers ────────────────────────────────────────────
    let providers = adapters::build_adapters(&config);
    if providers.is_empty() {
        warn!("No search providers configured — every query will fall back to Wikipedia");
    } else {
        let ids: Vec<&str> = providers.iter().map(|p| p.id()).collect();
        info!(providers = ?ids, "🌐 search rotation registered");
    }

    // ── Rotation State ──────────────────────────────────────────────
    let store: Arc<dyn StateStore> =
        Arc::new(FileStateStore::new(data_dir.join("rotation.json")));

    // ── Dispatcher + Intents ────────────────────────────────────────
    let dispatcher = Dispatcher::new(
        providers,
        Arc::clone(&store),
        Box::new(OllamaSummarizer::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
        )),
        Box::new(WikipediaSource::new()),
    );

    let matchers = intent::build_matchers(&config);
    info!(
        intents = matchers.len(),
        model = %config.ollama_model,
        "🧭 engine assembled"
    );

    let engine = Arc::new(AnswerEngine::new(matchers, dispatcher));

    // ── JSON-RPC Server ─────────────────────────────────────────────
    let srv = server::Server::new(
        data_dir.join("answerline.sock"),
        engine,
        store,
    );

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Answerline daemon ready");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    srv.run().await?;

    Ok(())
}
