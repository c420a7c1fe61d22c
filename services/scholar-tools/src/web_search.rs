//! Web search tool exposed to the agent.

use async_trait::async_trait;
use std::sync::Arc;

use crate::search::{render_hits, SearchProvider};
use crate::traits::{Tool, ToolResult};

/// Name the model uses to call web search.
pub const WEB_SEARCH_TOOL_NAME: &str = "tavily_search";

/// Let the agent search the web through a [`SearchProvider`].
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results: max_results.max(1),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for finding academic papers, authors, and recent research. \
         Input should be a search query; site: operators (e.g. site:arxiv.org) are supported."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
        let query = input.trim();
        if query.is_empty() {
            return Ok(ToolResult::failure("Search query must not be empty"));
        }

        match self.provider.search(query, self.max_results).await {
            Ok(mut hits) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    hits = hits.len(),
                    "Search completed"
                );
                hits.truncate(self.max_results);
                Ok(ToolResult::success(render_hits(query, &hits)))
            }
            Err(e) => Ok(ToolResult::failure(e.to_string())),
        }
    }
}
