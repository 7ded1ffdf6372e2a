//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) gives a working setup against the Hugging Face inference router.
//! See `config/intellibot.example.toml` for the annotated layout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use intellibot_core::chunk::{ChunkingParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use intellibot_core::session::{
    HistoryWindow, SessionOptions, DEFAULT_SYSTEM_PROMPT, DEFAULT_TOP_K,
};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: 0.0,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_tokens: None,
        }
    }
}

fn default_base_url() -> String {
    "https://router.huggingface.co/v1".to_string()
}
fn default_model() -> String {
    "meta-llama/Llama-3.1-8B-Instruct".to_string()
}
fn default_api_key_env() -> String {
    "HF_TOKEN".to_string()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HistoryConfig {
    /// Cap on history messages sent per request. Unset sends everything.
    #[serde(default)]
    pub max_messages: Option<usize>,
}

impl Config {
    /// Validated chunking parameters.
    pub fn chunking_params(&self) -> Result<ChunkingParams> {
        ChunkingParams::new(self.chunking.chunk_size, self.chunking.overlap)
            .context("Invalid [chunking] section")
    }

    /// Chunks to retrieve per question: `requested` if given, else
    /// `[retrieval] top_k`. A requested value of zero is rejected.
    pub fn top_k(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(0) => anyhow::bail!("--top-k must be >= 1"),
            Some(k) => Ok(k),
            None => Ok(self.retrieval.top_k),
        }
    }

    /// Session settings derived from this configuration.
    pub fn session_options(&self) -> Result<SessionOptions> {
        Ok(SessionOptions {
            system_prompt: self.model.system_prompt.clone(),
            chunking: self.chunking_params()?,
            top_k: self.retrieval.top_k,
            min_score: self.retrieval.min_score,
            window: match self.history.max_messages {
                Some(n) => HistoryWindow::Last(n),
                None => HistoryWindow::All,
            },
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    config.chunking_params()?;

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0]");
    }

    // Validate model
    if config.model.base_url.trim().is_empty() {
        anyhow::bail!("model.base_url must not be empty");
    }
    if config.model.model.trim().is_empty() {
        anyhow::bail!("model.model must not be empty");
    }
    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }

    // Validate history
    if config.history.max_messages == Some(0) {
        anyhow::bail!("history.max_messages must be >= 1 when set");
    }

    Ok(())
}
