//! Scripted collaborators for agent loop tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scholar_agent::{AgentExecutor, CompletionRequest, ExecutorOptions, ModelError, Provider};
use scholar_tools::{SearchHit, SearchProvider, Tool, ToolRegistry, ToolResult, WebSearchTool};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model that replays a fixed script and records every prompt it sees.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Self::with_results(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with `reply`.
    pub fn repeating(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Sleep before every reply.
    pub fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(ModelError::unavailable("scripted", "script exhausted")),
        }
    }
}

/// Search backend that records queries and returns canned hits.
#[derive(Default)]
pub struct ScriptedSearch {
    pub queries: Mutex<Vec<String>>,
    pub fail: bool,
}

impl ScriptedSearch {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str, max_results: usize) -> scholar_common::Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(scholar_common::Error::External("search backend down".into()));
        }
        Ok((1..=max_results.min(2))
            .map(|i| SearchHit {
                title: format!("Result {i} for {query}"),
                url: format!("https://arxiv.org/abs/2401.0000{i}"),
                snippet: "Abstract text.".into(),
            })
            .collect())
    }
}

/// Tool that never answers within a test timeout.
pub struct StuckTool;

#[async_trait]
impl Tool for StuckTool {
    fn name(&self) -> &str {
        "stuck"
    }

    fn description(&self) -> &str {
        "Never returns in time."
    }

    async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ToolResult::success("too late"))
    }
}

/// Tool that always answers with the same text.
pub struct CannedTool(pub &'static str);

#[async_trait]
impl Tool for CannedTool {
    fn name(&self) -> &str {
        "canned"
    }

    fn description(&self) -> &str {
        "Returns a fixed observation."
    }

    async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::success(self.0))
    }
}

/// Registry with the web search tool over `search`.
pub fn search_registry(search: Arc<ScriptedSearch>) -> ToolRegistry {
    ToolRegistry::new().register(Arc::new(WebSearchTool::new(search, 5)))
}

pub fn executor(model: Arc<ScriptedModel>, tools: ToolRegistry, options: ExecutorOptions) -> AgentExecutor {
    AgentExecutor::new(model, Arc::new(tools), options)
}

/// Options with short timeouts for tests.
pub fn fast_options() -> ExecutorOptions {
    ExecutorOptions {
        model_timeout: Duration::from_secs(5),
        ..ExecutorOptions::default()
    }
}

pub fn action(thought: &str, input: &str) -> String {
    format!(" {thought}\nAction: tavily_search\nAction Input: {input}")
}

pub fn final_answer(thought: &str, answer: &str) -> String {
    format!(" {thought}\nFinal Answer: {answer}")
}
