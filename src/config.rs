//! Daemon configuration — YAML file with env overrides.
//!
//! Credentials live in `~/.answerline/config.yaml`; a missing file is a
//! valid (empty) configuration and just means no search backends get
//! registered. The Ollama endpoint and model can also be overridden via
//! `ANSWERLINE_OLLAMA_URL` / `ANSWERLINE_OLLAMA_MODEL`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Direct-lookup credentials
    #[serde(default)]
    pub openweather_key: Option<String>,
    #[serde(default)]
    pub polygon_key: Option<String>,

    // Search provider credentials, one entry per backend
    #[serde(default)]
    pub serpapi_key: Option<String>,
    #[serde(default)]
    pub zenserp_key: Option<String>,
    #[serde(default)]
    pub google_keys: Vec<String>,
    #[serde(default)]
    pub google_cx: Option<String>,
    #[serde(default)]
    pub searchapi_key: Option<String>,
    #[serde(default)]
    pub proxycrawl_keys: Vec<String>,
    #[serde(default)]
    pub scraperapi_keys: Vec<String>,

    // Summarization endpoint
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_key: None,
            polygon_key: None,
            serpapi_key: None,
            zenserp_key: None,
            google_keys: Vec::new(),
            google_cx: None,
            searchapi_key: None,
            proxycrawl_keys: Vec::new(),
            scraperapi_keys: Vec::new(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
        }
    }
}

impl Config {
    /// Data directory holding the config file, rotation state, and
    /// socket.
    pub fn data_dir() -> PathBuf {
        let home = dirs::home_dir().expect("Cannot determine home directory");
        home.join(".answerline")
    }

    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("config.yaml");
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("ANSWERLINE_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Ok(model) = std::env::var("ANSWERLINE_OLLAMA_MODEL") {
            config.ollama_model = model;
        }

        Ok(config)
    }
}
