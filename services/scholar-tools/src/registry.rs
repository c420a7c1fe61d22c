//! Tool registry.
//!
//! Resolves tool names, renders the `{tools}` / `{tool_names}` prompt blocks,
//! and runs every invocation under a timeout.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::traits::{Tool, ToolSpec};

/// Default per-call timeout.
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(45);

/// Errors from invoking a tool through the registry.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under this name.
    #[error("{name} is not a valid tool, try one of [{}].", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    /// The tool ran and failed.
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },

    /// The tool did not answer in time.
    #[error("Tool '{tool}' timed out after {}s", timeout.as_secs())]
    Timeout { tool: String, timeout: Duration },
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Registry of the tools available to the agent.
///
/// Read-only after construction; share it between runs with `Arc`.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        if let Some(pos) = self.tools.iter().position(|t| t.name() == tool.name()) {
            tracing::warn!(tool = tool.name(), "Replacing previously registered tool");
            self.tools.remove(pos);
        }
        self.tools.push(tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Get tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Specs for all registered tools
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// The `{tools}` block: one `name: description` line per tool.
    pub fn describe(&self) -> String {
        self.specs()
            .iter()
            .map(ToolSpec::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name and return its observation text.
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
            available: self.tool_names(),
        })?;

        tracing::info!(tool = name, input = %input, "Invoking tool");

        match tokio::time::timeout(self.timeout, tool.execute(input)).await {
            Ok(Ok(result)) if result.success => {
                tracing::debug!(tool = name, output_len = result.output.len(), "Tool succeeded");
                Ok(result.output)
            }
            Ok(Ok(result)) => Err(ToolError::Execution {
                tool: name.to_string(),
                message: result.error.unwrap_or_else(|| "Unknown error".to_string()),
            }),
            Ok(Err(e)) => Err(ToolError::Execution {
                tool: name.to_string(),
                message: format!("{e:#}"),
            }),
            Err(_) => Err(ToolError::Timeout {
                tool: name.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}
