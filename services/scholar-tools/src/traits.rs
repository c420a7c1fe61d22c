//! Core Tool trait and types.
//!
//! All tools implement the `Tool` trait, giving the agent loop a uniform
//! `name → (input) → observation` contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result from executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Tool output (observation text).
    pub output: String,
    /// Error message if failed.
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Tool specification surfaced to the model inside the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name (must match `name()` method).
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: String,
}

impl ToolSpec {
    /// Prompt line in the `name: description` form.
    pub fn prompt_line(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// Trait for agent tools.
///
/// Implementations must be safe for concurrent use: one tool instance is
/// shared by every run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique, stable tool name.
    fn name(&self) -> &str;

    /// Description shown to the LLM.
    fn description(&self) -> &str;

    /// Execute the tool with the raw `Action Input` text.
    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult>;

    /// Generate a ToolSpec for the prompt.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeats its input."
        }

        async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(input))
        }
    }

    #[test]
    fn tool_result_success() {
        let result = ToolResult::success("done");
        assert!(result.success);
        assert_eq!(result.output, "done");
        assert!(result.error.is_none());
    }

    #[test]
    fn tool_result_failure() {
        let result = ToolResult::failure("something went wrong");
        assert!(!result.success);
        assert!(result.output.is_empty());
        assert_eq!(result.error.as_deref(), Some("something went wrong"));
    }

    #[test]
    fn spec_prompt_line() {
        let spec = Echo.spec();
        assert_eq!(spec.prompt_line(), "echo: Repeats its input.");
    }

    #[tokio::test]
    async fn execute_passes_input_through() {
        let result = Echo.execute("hello").await.unwrap();
        assert_eq!(result.output, "hello");
    }
}
