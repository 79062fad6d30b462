//! Completion backends behind the [`LlmClient`] seam.
//!
//! The HTTP client speaks the OpenAI-compatible chat-completions shape,
//! which covers OpenAI itself, Anthropic's compatibility endpoint and a
//! local Ollama. The `disabled` provider maps to a client that always
//! reports unavailability; callers are expected to have a deterministic
//! fallback ready.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use carelog_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds the client matching the configured provider.
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Disabled => Ok(Arc::new(DisabledLlmClient)),
        _ => Ok(Arc::new(HttpLlmClient::from_config(config)?)),
    }
}

/// Stands in when no provider is configured. Every call errors, which the
/// router and responders treat as their fail-open path.
pub struct DisabledLlmClient;

#[async_trait]
impl LlmClient for DisabledLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("no language model is configured")
    }
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

const MAX_COMPLETION_TOKENS: u32 = 512;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

struct SendFailure {
    message: String,
    retryable: bool,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let base = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());
        let endpoint = format!("{}/chat/completions", base.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("building llm http client")?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &ChatRequest<'_>) -> std::result::Result<String, SendFailure> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|error| SendFailure {
            retryable: error.is_timeout() || error.is_connect(),
            message: format!("llm request failed: {error}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.as_u16() == 429 || status.is_server_error();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or_else(|_| preview(&body));
            return Err(SendFailure {
                retryable,
                message: format!("llm request returned {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|error| SendFailure {
            retryable: false,
            message: format!("llm response decode failed: {error}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SendFailure {
                retryable: false,
                message: "llm response held no completion".to_string(),
            })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 0.2,
        };

        // One immediate retry on transient failures, nothing fancier.
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send(&request).await {
                Ok(text) => return Ok(text),
                Err(failure) => {
                    if failure.retryable && attempt <= self.max_retries {
                        tracing::warn!(
                            event_name = "llm.retry",
                            attempt,
                            error = %failure.message,
                            "retrying transient llm failure"
                        );
                        continue;
                    }
                    return Err(anyhow!(failure.message));
                }
            }
        }
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        LlmProvider::Ollama => OLLAMA_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect()
}
