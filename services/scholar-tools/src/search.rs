//! Web search capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scholar_common::util::truncate_with_ellipsis;

/// Longest snippet kept per hit in an observation.
const MAX_SNIPPET_CHARS: usize = 600;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A backend that turns a query into ranked hits.
///
/// Queries may carry `site:` operators; backends pass them through verbatim.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Backend name (e.g., "tavily")
    fn name(&self) -> &str;

    /// Run a query and return at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> scholar_common::Result<Vec<SearchHit>>;
}

/// Render hits as an observation block.
pub fn render_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for: {query}");
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let title = if hit.title.trim().is_empty() {
                "(untitled)"
            } else {
                hit.title.trim()
            };
            format!(
                "[{}] {}\nURL: {}\n{}",
                i + 1,
                title,
                hit.url,
                truncate_with_ellipsis(hit.snippet.trim(), MAX_SNIPPET_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn renders_numbered_blocks() {
        let hits = vec![
            hit("Surface codes", "https://arxiv.org/abs/1208.0928", "Review of surface codes."),
            hit("", "https://dl.acm.org/doi/1", "  untitled entry  "),
        ];
        let out = render_hits("surface code", &hits);
        assert_eq!(
            out,
            "[1] Surface codes\nURL: https://arxiv.org/abs/1208.0928\nReview of surface codes.\n\n\
             [2] (untitled)\nURL: https://dl.acm.org/doi/1\nuntitled entry"
        );
    }

    #[test]
    fn empty_hits() {
        assert_eq!(render_hits("nothing", &[]), "No results found for: nothing");
    }

    #[test]
    fn long_snippets_are_truncated() {
        let long = "x".repeat(MAX_SNIPPET_CHARS + 50);
        let out = render_hits("q", &[hit("t", "u", &long)]);
        assert!(out.ends_with("..."));
        assert!(out.len() < long.len());
    }
}
