//! Provider trait for LLM backends.
//!
//! The agent only needs text completion: one prompt in, one completion out.

mod compatible;

pub use compatible::CompatibleProvider;

use async_trait::async_trait;
use scholar_common::LlmConfig;
use std::time::Duration;
use thiserror::Error;

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<i64>,
    /// Sequences at which the backend should stop generating.
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            stop: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

/// Errors from a completion call.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The backend could not produce a completion.
    #[error("[{provider}] model unavailable: {message}")]
    Unavailable { provider: String, message: String },

    /// The call did not finish in time.
    #[error("model call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ModelError {
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// LLM provider trait.
///
/// Implementations handle authentication, request formatting, and response
/// parsing for a specific API. One instance is shared by concurrent runs.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "groq", "openai").
    fn name(&self) -> &str;

    /// Complete a prompt and return the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;

    /// Check if the provider supports a specific model.
    fn supports_model(&self, _model: &str) -> bool {
        true
    }

    /// Warm up the provider (e.g., pre-connect).
    async fn warmup(&self) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Build the configured provider.
///
/// `timeout` bounds each HTTP request; callers pass the agent's model timeout
/// so a single setting governs model calls.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<&str>,
    timeout: Duration,
) -> scholar_common::Result<CompatibleProvider> {
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            scholar_common::Error::MissingCredential(format!(
                "{} API key (GROQ_API_KEY or SCHOLAR_LLM_API_KEY)",
                config.provider
            ))
        })?;

    if let Some(base_url) = config.base_url.as_deref() {
        return Ok(CompatibleProvider::custom(&config.provider, base_url, api_key, timeout));
    }

    match config.provider.as_str() {
        "groq" => Ok(CompatibleProvider::groq(api_key, timeout)),
        "openai" => Ok(CompatibleProvider::openai(api_key, timeout)),
        "deepseek" => Ok(CompatibleProvider::deepseek(api_key, timeout)),
        "moonshot" => Ok(CompatibleProvider::moonshot(api_key, timeout)),
        other => Err(scholar_common::Error::Config(format!(
            "Unknown LLM provider '{other}'; set llm.base_url for custom OpenAI-compatible endpoints"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider;

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
            Ok(format!("Echo: {}", request.prompt))
        }
    }

    #[tokio::test]
    async fn mock_provider_works() {
        let provider = MockProvider;
        assert_eq!(provider.name(), "mock");
        assert!(provider.supports_model("any-model"));
        assert!(provider.warmup().await.is_ok());

        let response = provider
            .complete(&CompletionRequest::new("Hello", "test"))
            .await
            .unwrap();
        assert_eq!(response, "Echo: Hello");
    }

    #[test]
    fn request_builder() {
        let request = CompletionRequest::new("p", "m")
            .with_temperature(0.2)
            .with_max_tokens(128)
            .with_stop(["\nObservation:"]);
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, Some(128));
        assert_eq!(request.stop, vec!["\nObservation:".to_string()]);
    }

    #[test]
    fn error_display() {
        let err = ModelError::unavailable("groq", "API error (503)");
        assert_eq!(err.to_string(), "[groq] model unavailable: API error (503)");
        assert_eq!(
            ModelError::Timeout(Duration::from_secs(90)).to_string(),
            "model call timed out after 90s"
        );
    }

    #[test]
    fn create_provider_by_name() {
        let config = LlmConfig::default();
        let provider = create_provider(&config, Some("gsk_test"), Duration::from_secs(90)).unwrap();
        assert_eq!(provider.name(), "groq");

        let missing = create_provider(&config, None, Duration::from_secs(90)).err().unwrap();
        assert!(missing.is_missing_credential());

        let unknown = LlmConfig {
            provider: "acme".into(),
            ..LlmConfig::default()
        };
        assert!(create_provider(&unknown, Some("k"), Duration::from_secs(90)).is_err());

        let custom = LlmConfig {
            provider: "local".into(),
            base_url: Some("http://localhost:8080".into()),
            ..LlmConfig::default()
        };
        assert_eq!(create_provider(&custom, Some("k"), Duration::from_secs(90)).unwrap().name(), "local");
    }
}
