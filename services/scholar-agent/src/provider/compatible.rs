//! Generic OpenAI-compatible provider.
//!
//! Groq, OpenAI, DeepSeek, Moonshot and most other hosted LLM APIs follow the
//! same `/v1/chat/completions` format. The prompt is sent as a single user
//! message.

use super::{CompletionRequest, ModelError, Provider};
use async_trait::async_trait;
use reqwest::Client;
use scholar_common::util::sanitize_for_log;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// A provider that speaks the OpenAI-compatible chat completions API.
pub struct CompatibleProvider {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompatibleRequest<'a> {
    model: &'a str,
    messages: Vec<CompatibleMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "no_stop")]
    stop: &'a [String],
}

fn no_stop(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Serialize)]
struct CompatibleMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompatibleResponse {
    choices: Vec<CompatibleChoice>,
    #[serde(default)]
    usage: Option<CompatibleUsage>,
}

#[derive(Debug, Deserialize)]
struct CompatibleChoice {
    message: CompatibleResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompatibleResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompatibleUsage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
}

impl CompatibleProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(name: &str, base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Create Groq provider.
    pub fn groq(api_key: &str, timeout: Duration) -> Self {
        Self::new("groq", "https://api.groq.com/openai", api_key, timeout)
    }

    /// Create OpenAI provider.
    pub fn openai(api_key: &str, timeout: Duration) -> Self {
        Self::new("openai", "https://api.openai.com", api_key, timeout)
    }

    /// Create DeepSeek provider.
    pub fn deepseek(api_key: &str, timeout: Duration) -> Self {
        Self::new("deepseek", "https://api.deepseek.com", api_key, timeout)
    }

    /// Create Moonshot (Kimi) provider.
    pub fn moonshot(api_key: &str, timeout: Duration) -> Self {
        Self::new("moonshot", "https://api.moonshot.cn", api_key, timeout)
    }

    /// Create a custom provider with any OpenAI-compatible endpoint.
    pub fn custom(name: &str, base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self::new(name, base_url, api_key, timeout)
    }

    fn unavailable(&self, message: impl AsRef<str>) -> ModelError {
        ModelError::unavailable(&self.name, sanitize_for_log(message.as_ref()))
    }
}

#[async_trait]
impl Provider for CompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let start = Instant::now();

        let body = CompatibleRequest {
            model: &request.model,
            messages: vec![CompatibleMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: &request.stop,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout)
                } else {
                    self.unavailable(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.unavailable(format!("API error ({}): {}", status.as_u16(), error_text)));
        }

        let result: CompatibleResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("Failed to parse response: {e}")))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.unavailable("No choices in response"))?;

        let (prompt_tokens, completion_tokens) = result
            .usage
            .map_or((None, None), |u| (u.prompt_tokens, u.completion_tokens));
        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            latency_ms = start.elapsed().as_millis() as u64,
            prompt_tokens,
            completion_tokens,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "Completion received"
        );

        Ok(choice.message.content.unwrap_or_default())
    }
}
