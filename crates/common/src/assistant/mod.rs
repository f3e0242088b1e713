//! Chat-completion client behind the AI assistant endpoint
//!
//! The gateway forwards a single user message to an OpenAI-compatible
//! `chat/completions` API and returns the first choice's text.

use crate::config::AssistantConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for chat-completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Answer a single user prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Client for any OpenAI-compatible chat-completions API (Groq, OpenAI, ...)
pub struct OpenAICompatibleClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_answer(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream {
                message: "Completion response contained no choices".to_string(),
            })
    }
}

impl OpenAICompatibleClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::Upstream {
            message: format!("Failed to parse response: {}", e),
        })?;

        result.into_answer()
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.make_request(prompt).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::record_assistant_call(outcome, start.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            tracing::warn!(model = %self.model, error = %e, "Completion request failed");
        }

        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock completion client for testing
pub struct MockCompletionClient {
    reply: std::result::Result<String, String>,
}

impl MockCompletionClient {
    /// Always answer with `answer`
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            reply: Ok(answer.into()),
        }
    }

    /// Always fail as an upstream error with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
        }
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.reply
            .clone()
            .map_err(|message| AppError::Upstream { message })
    }

    fn model_name(&self) -> &str {
        "mock-completion"
    }
}

/// Create a completion client from configuration.
///
/// Returns `None` when no API key is configured; the assistant endpoint is
/// then unavailable.
pub fn create_client(config: &AssistantConfig) -> Result<Option<Arc<dyn CompletionClient>>> {
    let Some(api_key) = config.api_key.clone().filter(|key| !key.is_empty()) else {
        tracing::warn!("No assistant API key configured, assistant disabled");
        return Ok(None);
    };

    let client = OpenAICompatibleClient::new(
        api_key,
        config.model.clone(),
        config.api_base.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Some(Arc::new(client)))
}
