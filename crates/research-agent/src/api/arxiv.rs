//! arXiv Atom feed client

use super::ensure_success;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::sources::AcademicFeed;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// Client for the arXiv query API
pub struct ArxivClient {
    client: Client,
    api_base: Url,
    max_results: usize,
}

impl ArxivClient {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let api_base = Url::parse(&config.arxiv_api_base)
            .map_err(|e| ResearchError::Config(format!("invalid arXiv endpoint: {e}")))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            api_base,
            max_results: config.academic_max_results,
        })
    }

    /// Query URL searching all fields for `query`
    pub fn query_url(&self, query: &str) -> Url {
        let mut url = self.api_base.clone();
        url.query_pairs_mut()
            .append_pair("search_query", &format!("all:{query}"))
            .append_pair("start", "0")
            .append_pair("max_results", &self.max_results.to_string());
        url
    }
}

#[async_trait]
impl AcademicFeed for ArxivClient {
    #[instrument(skip(self))]
    async fn fetch_feed(&self, query: &str) -> Result<String> {
        let url = self.query_url(query);
        debug!("Fetching arXiv feed from {url}");

        let response = self.client.get(url).send().await?;
        let response = ensure_success("arXiv", response).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url() {
        let client = ArxivClient::new(&ResearchConfig::default()).unwrap();
        let url = client.query_url("finance ESG");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.host_str(), Some("export.arxiv.org"));
        assert_eq!(
            pairs,
            vec![
                ("search_query".to_string(), "all:finance ESG".to_string()),
                ("start".to_string(), "0".to_string()),
                ("max_results".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_url_uses_configured_limit() {
        let config = ResearchConfig::builder()
            .academic_max_results(2)
            .build()
            .unwrap();
        let url = ArxivClient::new(&config).unwrap().query_url("bonds");
        assert!(
            url.query_pairs()
                .any(|(k, v)| k == "max_results" && v == "2")
        );
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let config = ResearchConfig {
            arxiv_api_base: "not a url".to_string(),
            ..ResearchConfig::default()
        };
        assert!(matches!(
            ArxivClient::new(&config),
            Err(ResearchError::Config(_))
        ));
    }
}
