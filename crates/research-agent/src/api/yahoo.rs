//! Yahoo Finance chart client
//!
//! The chart payload is passed through untouched; the agent only needs to
//! know which symbols have data.

use super::ensure_success;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::sources::MarketData;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Yahoo Finance chart client with rate limiting
pub struct YahooChartClient {
    client: Client,
    api_base: Url,
    rate_limiter: SharedRateLimiter,
}

impl YahooChartClient {
    /// Create a client from the research configuration
    ///
    /// Requests are limited to `market_rate_limit_per_minute`.
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let api_base = Url::parse(&config.market_api_base)
            .map_err(|e| ResearchError::Config(format!("invalid market endpoint: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(ResearchError::Config(format!(
                "market endpoint cannot take a symbol path: {api_base}"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.market_rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            api_base,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Chart URL for `symbol`
    pub fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(symbol);
        }
        url
    }
}

#[async_trait]
impl MarketData for YahooChartClient {
    #[instrument(skip(self))]
    async fn fetch_quote(&self, symbol: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let url = self.chart_url(symbol);
        debug!("Fetching chart data from {url}");

        let response = self.client.get(url).send().await?;
        let response = ensure_success("Yahoo Finance", response).await?;
        response.json::<Value>().await.map_err(|e| {
            ResearchError::transport("Yahoo Finance", format!("Failed to parse response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_url() {
        let client = YahooChartClient::new(&ResearchConfig::default()).unwrap();
        assert_eq!(
            client.chart_url("SPY").as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/SPY"
        );
        assert_eq!(
            client.chart_url("BRK/B").as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/BRK%2FB"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let config = ResearchConfig {
            market_api_base: "http://localhost:9000/chart/".to_string(),
            ..ResearchConfig::default()
        };
        let client = YahooChartClient::new(&config).unwrap();
        assert_eq!(
            client.chart_url("AAPL").as_str(),
            "http://localhost:9000/chart/AAPL"
        );
    }
}
