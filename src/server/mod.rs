//! Unix socket JSON-RPC server — the daemon surface for the chat/voice
//! front end.
//!
//! Listens on ~/.answerline/answerline.sock for line-delimited JSON-RPC
//! 2.0 requests. All communication is local-only — no TCP network
//! exposure.
//!
//! Methods:
//! - `ai.answer`          { query } → { answer }
//! - `ai.health`          rotation snapshot per provider
//! - `ai.admin.resetProviders`  clears the unavailable set

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::info;

use crate::dispatch::rotation::StateStore;
use crate::engine::AnswerEngine;

// ── JSON-RPC Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: Option<serde_json::Value>,
    id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0".into(), result: Some(result), error: None, id }
    }
    fn error(id: Option<serde_json::Value>, code: i32, message: String) -> Self {
        Self { jsonrpc: "2.0".into(), result: None, error: Some(JsonRpcError { code, message }), id }
    }
}

// ── Server ──────────────────────────────────────────────────────────

pub struct Server {
    socket_path: PathBuf,
    engine: Arc<AnswerEngine>,
    store: Arc<dyn StateStore>,
}

impl Server {
    pub fn new(
        socket_path: PathBuf,
        engine: Arc<AnswerEngine>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            socket_path,
            engine,
            store,
        }
    }

    pub async fn run(&self) -> Result<()> {
        // Remove stale socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        // Ensure parent directory exists
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Restrict socket permissions (owner-only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(
            socket = %self.socket_path.display(),
            "🛰️ Answerline server listening"
        );

        loop {
            let (stream, _) = listener.accept().await?;
            let engine = Arc::clone(&self.engine);
            let store = Arc::clone(&self.store);

            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                // Bound reads to 1 MB to prevent oversized payloads
                const MAX_REQUEST_BYTES: u64 = 1_048_576;
                let bounded = reader.take(MAX_REQUEST_BYTES);
                let mut reader = BufReader::new(bounded);
                let mut line = String::new();

                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) => break, // EOF
                        Ok(_) => {
                            let response = handle_request(&line, &engine, store.as_ref()).await;
                            let resp_json = serde_json::to_string(&response).unwrap_or_default();
                            if writer.write_all(resp_json.as_bytes()).await.is_err() { break; }
                            if writer.write_all(b"\n").await.is_err() { break; }
                        }
                        Err(_) => break,
                    }
                }
            });
        }
    }
}

// ── Request Handling ────────────────────────────────────────────────

async fn handle_request(
    raw: &str,
    engine: &AnswerEngine,
    store: &dyn StateStore,
) -> JsonRpcResponse {
    let req: JsonRpcRequest = match serde_json::from_str(raw) {
        Ok(r) => r,
        Err(e) => return JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e)),
    };

    let params = req.params.unwrap_or(serde_json::Value::Null);

    match req.method.as_str() {
        "ai.answer" => handle_answer(req.id, params, engine).await,
        "ai.health" => handle_health(req.id, engine, store),
        "ai.admin.resetProviders" => handle_reset(req.id, store),
        _ => JsonRpcResponse::error(req.id, -32601, format!("Unknown method: {}", req.method)),
    }
}

async fn handle_answer(
    id: Option<serde_json::Value>,
    params: serde_json::Value,
    engine: &AnswerEngine,
) -> JsonRpcResponse {
    let query = match params.get("query").and_then(|v| v.as_str()) {
        Some(q) if !q.trim().is_empty() => q.trim(),
        _ => {
            return JsonRpcResponse::error(
                id,
                -32602,
                "Invalid params: non-empty `query` string required".into(),
            )
        }
    };

    let answer = engine.answer(query).await;
    JsonRpcResponse::success(id, serde_json::json!({ "answer": answer }))
}

fn handle_health(
    id: Option<serde_json::Value>,
    engine: &AnswerEngine,
    store: &dyn StateStore,
) -> JsonRpcResponse {
    let state = store.load();
    let ids = engine.provider_ids();

    let providers: Vec<serde_json::Value> = ids
        .iter()
        .enumerate()
        .map(|(i, provider)| {
            serde_json::json!({
                "id": provider,
                "unavailable": state.is_unavailable(provider),
                "next": !ids.is_empty() && i == state.next_index % ids.len(),
            })
        })
        .collect();

    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "providers": providers,
            "next_index": state.next_index,
            "unavailable_count": state.unavailable.len(),
            "updated_at": state.updated_at.to_rfc3339(),
        }),
    )
}

fn handle_reset(id: Option<serde_json::Value>, store: &dyn StateStore) -> JsonRpcResponse {
    match store.reset() {
        Ok(()) => {
            info!("🔄 provider rotation state reset");
            JsonRpcResponse::success(id, serde_json::json!({ "reset": true }))
        }
        Err(e) => JsonRpcResponse::error(id, -32000, e.to_string()),
    }
}
