//! Research assistant facade.
//!
//! Wires provider, tools, and executor from configuration, and turns a
//! caller request (query, history, follow-up hint) into one traced run.

use scholar_common::logging::generate_trace_id;
use scholar_common::{run_span, Config};
use scholar_memory::{ConversationStore, ConversationTurn};
use scholar_tools::{TavilySearch, ToolRegistry, WebSearchTool};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::ConversationContext;
use crate::executor::{AgentExecutor, AgentRun, ExecutorOptions};
use crate::prompt::select;
use crate::provider::{create_provider, Provider};

/// One research request from a caller.
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub query: String,
    /// Prior turns, oldest first. Only the most recent window is used.
    pub history: Vec<ConversationTurn>,
    /// The caller believes this continues the conversation.
    pub follow_up: bool,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn follow_up(mut self, follow_up: bool) -> Self {
        self.follow_up = follow_up;
        self
    }
}

/// Entry point used by the CLI and tests.
pub struct ResearchAssistant {
    executor: AgentExecutor,
    context_window: usize,
}

impl ResearchAssistant {
    pub fn new(executor: AgentExecutor, context_window: usize) -> Self {
        Self {
            executor,
            context_window,
        }
    }

    /// Build the Groq/Tavily-backed assistant from configuration.
    pub fn from_config(config: &Config) -> scholar_common::Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(create_provider(
            &config.llm,
            config.secrets.llm_api_key.as_deref(),
            config.agent.model_timeout(),
        )?);

        let search = TavilySearch::from_config(&config.search, config.secrets.search_api_key.as_deref())?;
        let tools = ToolRegistry::new()
            .with_timeout(config.agent.tool_timeout())
            .register(Arc::new(WebSearchTool::new(
                Arc::new(search),
                config.search.max_results,
            )));

        tracing::debug!(
            provider = provider.name(),
            model = %config.llm.model,
            tools = ?tools.tool_names(),
            "Research assistant configured"
        );

        let executor = AgentExecutor::new(provider, Arc::new(tools), ExecutorOptions::from_config(config));
        Ok(Self::new(executor, config.agent.context_window_turns))
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Run one request to a terminal state inside its own `agent_run` span.
    pub async fn research(&self, request: ResearchRequest, cancel: &CancellationToken) -> AgentRun {
        let context = ConversationContext::new(request.history, self.context_window);
        let template = select(&request.query, &context, request.follow_up);
        let trace_id = generate_trace_id();

        self.executor
            .run(request.query.trim(), template, &context, cancel)
            .instrument(run_span!(trace_id, mode = %template))
            .await
    }
}

/// Store the user query and the assistant answer of a completed run as one
/// exchange.
///
/// Aborted runs are not persisted; returns the two new ids otherwise.
pub async fn persist_exchange(
    store: &dyn ConversationStore,
    query: &str,
    run: &AgentRun,
) -> anyhow::Result<Option<(i64, i64)>> {
    let Some(answer) = run.answer() else {
        tracing::debug!("Run did not complete, nothing persisted");
        return Ok(None);
    };

    let (user_id, assistant_id) = store.append_exchange(query, answer).await?;
    tracing::debug!(store = store.name(), user_id, assistant_id, "Exchange persisted");
    Ok(Some((user_id, assistant_id)))
}
