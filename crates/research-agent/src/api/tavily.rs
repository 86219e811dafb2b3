//! Tavily web search client

use super::ensure_success;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::model::WebSearchResult;
use crate::sources::WebSearch;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Tavily search client
pub struct TavilyClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    max_results: usize,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<WebSearchResult>,
}

impl TavilyClient {
    /// Create a client from the research configuration
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            api_key: config.tavily_api_key.clone(),
            api_base: config.tavily_api_base.trim_end_matches('/').to_string(),
            max_results: config.web_max_results,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    #[instrument(skip(self), fields(api_base = %self.api_base))]
    async fn search(&self, query: &str) -> Result<Vec<WebSearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ResearchError::Config("Tavily API key is not configured".to_string()))?;

        let response = self
            .client
            .post(format!("{}/search", self.api_base))
            .json(&SearchRequest {
                api_key,
                query,
                search_depth: "basic",
                max_results: self.max_results,
            })
            .send()
            .await?;

        let response = ensure_success("Tavily", response).await?;
        let body: SearchResponse = response.json().await.map_err(|e| {
            ResearchError::transport("Tavily", format!("Failed to parse response: {e}"))
        })?;

        debug!("Tavily returned {} results", body.results.len());
        Ok(body.results)
    }
}
