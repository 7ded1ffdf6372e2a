//! HTTP chat-completion client.
//!
//! [`HttpChatModel`] implements the core [`ChatModel`] trait over the
//! OpenAI-compatible `POST {base_url}/chat/completions` protocol, which the
//! Hugging Face inference router, OpenAI, Ollama and llama.cpp all speak.
//!
//! # Retry Strategy
//!
//! The session never retries, so this client does:
//! - HTTP 429 (rate limited), 5xx, timeouts and network errors → retry
//! - HTTP 401/403 → fail immediately as [`ModelError::Auth`]
//! - Other 4xx → fail immediately
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use intellibot_core::models::Message;
use intellibot_core::session::ChatModel;
use intellibot_core::ModelError;

use crate::config::ModelConfig;

/// Chat model reached over HTTP with a bearer token.
pub struct HttpChatModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl HttpChatModel {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable named by
    /// `api_key_env` is not set, or the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow!(
                "{} not found in the environment or .env file",
                config.api_key_env
            )
        })?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Full chat-completions URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, messages: &[Message]) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = Value::from(max_tokens);
        }
        body
    }

    async fn send_once(&self, body: &Value) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let status = status.as_u16();
            return Err(if status == 401 || status == 403 {
                ModelError::Auth { status, message }
            } else {
                ModelError::Api { status, message }
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        parse_reply(&json)
    }

    fn transport_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.timeout)
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let body = self.request_body(messages);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(attempt, ?delay, "retrying model request");
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() => {
                    tracing::debug!(attempt, error = %e, "transient model error");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ModelError::Transport("no request attempted".to_string())))
    }
}

/// Extract `choices[0].message.content` from a chat-completion response.
fn parse_reply(json: &Value) -> Result<String, ModelError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ModelError::Malformed("missing choices[0].message.content".to_string())
        })
}
