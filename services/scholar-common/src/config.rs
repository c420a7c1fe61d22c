//! Configuration management for Scholar.
//!
//! Scholar reads a single configuration file at `~/.scholar/config.json`,
//! with credentials optionally split out into `~/.scholar/secrets.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. `secrets.json` (merged under `secrets`)
//! 3. `config.json`
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SCHOLAR_LLM_API_KEY` / `GROQ_API_KEY` → secrets.llm_api_key
//! - `TAVILY_API_KEY` → secrets.search_api_key
//! - `SCHOLAR_MODEL` → llm.model
//! - `SCHOLAR_LOG_LEVEL` → observability.log_level
//! - `SCHOLAR_DB_PATH` → memory.path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config_loader::load_modular_config;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".scholar"),
        |dirs| dirs.home_dir().join(".scholar"),
    )
}

// ============================================================================
// LLM Configuration
// ============================================================================

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (groq, openai, deepseek, or any OpenAI-compatible name)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Override for the provider base URL (OpenAI-compatible endpoint)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model identifier sent to the provider
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f64,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,

    /// Retries after a failed or timed-out completion call
    #[serde(default = "default_llm_retries")]
    pub retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: None,
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            retries: default_llm_retries(),
        }
    }
}

fn default_llm_provider() -> String {
    "groq".into()
}

fn default_llm_model() -> String {
    "moonshotai/kimi-k2-instruct-0905".into()
}

fn default_max_tokens() -> i64 {
    4096
}

fn default_llm_retries() -> u32 {
    1
}

// ============================================================================
// Search Configuration
// ============================================================================

/// Web search capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search backend (currently only `tavily`)
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Override for the search API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum results returned per search call
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Tavily search depth (`basic` or `advanced`)
    #[serde(default = "default_search_depth")]
    pub search_depth: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            base_url: None,
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
            search_depth: default_search_depth(),
        }
    }
}

fn default_search_provider() -> String {
    "tavily".into()
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    30
}

fn default_search_depth() -> String {
    "basic".into()
}

// ============================================================================
// Agent Configuration
// ============================================================================

/// What the agent loop does when a tool call exceeds its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTimeoutPolicy {
    /// Feed the timeout back to the model as an observation
    #[default]
    Observe,
    /// End the run
    Abort,
}

/// Agent loop budgets and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum Thought/Action/Observation cycles per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Maximum malformed completions recovered per run
    #[serde(default = "default_max_parse_retries")]
    pub max_parse_retries: u32,

    /// Timeout for a single model completion call, including the HTTP request
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,

    /// Timeout for a single tool invocation
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Behaviour on tool timeout
    #[serde(default)]
    pub tool_timeout_policy: ToolTimeoutPolicy,

    /// Most recent conversation turns shown to the model in follow-up mode
    #[serde(default = "default_context_window_turns")]
    pub context_window_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_parse_retries: default_max_parse_retries(),
            model_timeout_secs: default_model_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            tool_timeout_policy: ToolTimeoutPolicy::default(),
            context_window_turns: default_context_window_turns(),
        }
    }
}

impl AgentConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

fn default_max_steps() -> u32 {
    15
}

fn default_max_parse_retries() -> u32 {
    3
}

fn default_model_timeout() -> u64 {
    90
}

fn default_tool_timeout() -> u64 {
    45
}

fn default_context_window_turns() -> usize {
    6
}

// ============================================================================
// Memory / Observability / Secrets
// ============================================================================

/// Conversation persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryConfig {
    /// SQLite database path (supports `~`)
    #[serde(default)]
    pub path: Option<String>,
}

impl MemoryConfig {
    /// Resolve the database path, expanding `~` and falling back to the config dir.
    pub fn db_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => config_dir().join("conversation_history.db"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets clamped to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Credentials. Usually kept in `secrets.json` or the environment.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub search_api_key: Option<String>,
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "***"))
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl Config {
    /// Load configuration from the default directory.
    pub fn load() -> Result<Self> {
        Self::load_dir(&config_dir())
    }

    /// Load `config.json` and `secrets.json` from a directory.
    ///
    /// Missing files fall back to defaults.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let value = load_modular_config(Some(dir.to_path_buf()))?;
        serde_json::from_value(value)
            .with_context(|| format!("Failed to parse config from {}", dir.display()))
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SCHOLAR_LLM_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
            self.secrets.llm_api_key = Some(key);
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.secrets.search_api_key = Some(key);
        }
        if let Some(model) = lookup("SCHOLAR_MODEL") {
            self.llm.model = model;
        }
        if let Some(level) = lookup("SCHOLAR_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(path) = lookup("SCHOLAR_DB_PATH") {
            self.memory.path = Some(path);
        }
    }
}
