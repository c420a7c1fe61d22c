//! Tavily search backend.
//!
//! POSTs to `{base}/search` with a bearer key and maps the `results` array
//! onto [`SearchHit`]s.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use scholar_common::util::sanitize_for_log;
use scholar_common::{Error, Result, SearchConfig};

use crate::search::{SearchHit, SearchProvider};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search API client.
pub struct TavilySearch {
    base_url: String,
    api_key: String,
    search_depth: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    /// Create a client against an explicit base URL.
    pub fn new(base_url: &str, api_key: &str, search_depth: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            search_depth: search_depth.to_string(),
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build from configuration. Fails when no search key is available.
    pub fn from_config(config: &SearchConfig, api_key: Option<&str>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::MissingCredential("search API key (TAVILY_API_KEY)".into()))?;

        Ok(Self::new(
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            api_key,
            &config.search_depth,
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/search", self.base_url);
        let body = TavilyRequest {
            query,
            max_results,
            search_depth: &self.search_depth,
            include_answer: false,
        };

        tracing::debug!(query = %query, max_results, "Tavily search");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::External(format!("Tavily request failed: {}", sanitize_for_log(&e.to_string())))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "Tavily API error ({}): {}",
                status.as_u16(),
                sanitize_for_log(&error_text)
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Invalid Tavily response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}
