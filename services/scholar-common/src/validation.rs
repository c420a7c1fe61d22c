//! Configuration validation.
//!
//! Checks that budgets, timeouts, and ranges are usable before the agent
//! starts, reporting every problem at once.

use thiserror::Error;

use crate::config::{AgentConfig, Config, LlmConfig, ObservabilityConfig, SearchConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

fn collect(errors: Vec<ValidationError>) -> ValidationResult<()> {
    let mut errors = errors;
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let sections = [
            self.llm.validate(),
            self.search.validate(),
            self.agent.validate(),
            self.observability.validate(),
        ];

        let mut errors = Vec::new();
        for result in sections {
            match result {
                Ok(()) => {}
                Err(ValidationError::Multiple(inner)) => errors.extend(inner),
                Err(e) => errors.push(e),
            }
        }
        collect(errors)
    }
}

impl Config {
    /// Require the credentials the CLI needs to run a research query.
    pub fn require_credentials(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if self.secrets.llm_api_key.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError::MissingField {
                field: "secrets.llm_api_key".into(),
            });
        }
        if self.secrets.search_api_key.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError::MissingField {
                field: "secrets.search_api_key".into(),
            });
        }
        collect(errors)
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if self.model.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "llm.model".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.push(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
        if self.max_tokens <= 0 {
            errors.push(invalid("llm.max_tokens", "must be greater than 0"));
        }
        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(invalid("llm.base_url", "must start with http:// or https://"));
            }
        }
        collect(errors)
    }
}

impl Validate for SearchConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if self.provider != "tavily" {
            errors.push(invalid("search.provider", "only 'tavily' is supported"));
        }
        if !(1..=20).contains(&self.max_results) {
            errors.push(invalid("search.max_results", "must be between 1 and 20"));
        }
        if self.timeout_secs == 0 {
            errors.push(invalid("search.timeout_secs", "must be greater than 0"));
        }
        if !matches!(self.search_depth.as_str(), "basic" | "advanced") {
            errors.push(invalid("search.search_depth", "must be 'basic' or 'advanced'"));
        }
        collect(errors)
    }
}

impl Validate for AgentConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if self.max_steps == 0 {
            errors.push(invalid("agent.max_steps", "must be greater than 0"));
        }
        if self.model_timeout_secs == 0 {
            errors.push(invalid("agent.model_timeout_secs", "must be greater than 0"));
        }
        if self.tool_timeout_secs == 0 {
            errors.push(invalid("agent.tool_timeout_secs", "must be greater than 0"));
        }
        if self.context_window_turns == 0 {
            errors.push(invalid("agent.context_window_turns", "must be greater than 0"));
        }
        collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let level = self.log_level.to_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(invalid(
                "observability.log_level",
                "must be one of trace, debug, info, warn, error",
            ));
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(invalid("observability.log_format", "must be 'json' or 'pretty'"));
        }
        Ok(())
    }
}
