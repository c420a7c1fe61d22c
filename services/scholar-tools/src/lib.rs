//! Scholar Tools - capabilities the research agent can invoke.
//!
//! Tools take a single line of text as input and produce a text observation:
//! - `Tool` trait and `ToolResult`
//! - `ToolRegistry` for name lookup, prompt descriptions, and timeouts
//! - Web search (`SearchProvider` capability, Tavily backend, `WebSearchTool`)

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod registry;
pub mod search;
pub mod tavily;
pub mod traits;
pub mod web_search;

pub use registry::{ToolError, ToolRegistry};
pub use search::{render_hits, SearchHit, SearchProvider};
pub use tavily::TavilySearch;
pub use traits::{Tool, ToolResult, ToolSpec};
pub use web_search::{WebSearchTool, WEB_SEARCH_TOOL_NAME};
